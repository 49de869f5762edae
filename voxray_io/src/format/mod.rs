//! Artifact file formats.
//!
//! Ray lookup tables and point-cloud chunks share one binary container: a
//! dense `f64` matrix behind a 16-byte dimension header (see [`matrix`]).
//! Camera poses are plain text (see [`pose`]).
//!
//! # Example
//!
//! ```no_run
//! use voxray_io::format::{discover_chunks, PointChunk};
//!
//! for path in discover_chunks("dataset", "DUCATI", ".bin")? {
//!     let chunk = PointChunk::load(&path)?;
//!     println!("{}: {} points", path.display(), chunk.len());
//! }
//! # Ok::<(), voxray_io::IoError>(())
//! ```

pub mod chunk;
pub mod header;
pub mod matrix;
pub mod pose;

pub use chunk::{discover_chunks, PointChunk};
pub use header::{encoded_size, MatrixHeader, ELEMENT_SIZE, HEADER_SIZE};
pub use matrix::{
    decode_matrix, encode_matrix, load_matrix, load_text_matrix, parse_text_matrix, read_matrix,
    save_matrix, write_matrix, Matrix,
};
pub use pose::{load_pose, parse_pose};
