//! Rectified ↔ raw pixel correspondence.
//!
//! Built from rows of four integers `rectRow rectCol rawRow rawCol`. Both
//! directions are stored as sensor-sized grids; unset or out-of-bounds
//! lookups return `None`. The two maps are independent: later rows overwrite
//! earlier ones, so `to_raw` followed by `to_rectified` need not be the
//! identity.

use std::path::Path;

use voxray_core::PixelCoord;

use super::grid2::Grid2;
use crate::error::{IoError, Result};

/// Bidirectional pixel lookup between rectified and raw images.
#[derive(Debug, Clone, PartialEq)]
pub struct RemapTable {
    to_raw: Grid2<Option<PixelCoord>>,
    to_rectified: Grid2<Option<PixelCoord>>,
}

impl RemapTable {
    /// Build from `[rectRow, rectCol, rawRow, rawCol]` rows for a
    /// `rows x cols` sensor. Rows referencing a pixel outside the sensor are
    /// skipped.
    pub fn from_rows(rows: usize, cols: usize, entries: &[[i64; 4]]) -> Self {
        let mut table = Self {
            to_raw: Grid2::new(rows, cols, None),
            to_rectified: Grid2::new(rows, cols, None),
        };

        let mut ignored = 0usize;
        for entry in entries {
            let rect = table.pixel(entry[0], entry[1]);
            let raw = table.pixel(entry[2], entry[3]);
            match rect.zip(raw) {
                Some((rect, raw)) => {
                    table.to_raw.set(rect.row, rect.col, Some(raw));
                    table.to_rectified.set(raw.row, raw.col, Some(rect));
                }
                None => ignored += 1,
            }
        }

        if ignored > 0 {
            log::warn!(
                "remap table: ignored {} correspondences outside the {}x{} sensor",
                ignored,
                rows,
                cols
            );
        }
        table
    }

    fn pixel(&self, row: i64, col: i64) -> Option<PixelCoord> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        (row < self.to_raw.rows() && col < self.to_raw.cols()).then_some(PixelCoord::new(row, col))
    }

    /// Load a whitespace text table.
    ///
    /// Blank lines are skipped; any other line must hold exactly four
    /// integers or the load fails naming the line.
    pub fn load_text(path: impl AsRef<Path>, rows: usize, cols: usize) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
        let entries = parse_entries(&text, path)?;
        let table = Self::from_rows(rows, cols, &entries);
        log::info!(
            "loaded remap table {} ({} correspondences)",
            path.display(),
            entries.len()
        );
        Ok(table)
    }

    /// Raw pixel for a rectified pixel.
    #[inline]
    pub fn to_raw(&self, row: usize, col: usize) -> Option<PixelCoord> {
        self.to_raw.get(row, col).copied().flatten()
    }

    /// Rectified pixel for a raw pixel.
    #[inline]
    pub fn to_rectified(&self, row: usize, col: usize) -> Option<PixelCoord> {
        self.to_rectified.get(row, col).copied().flatten()
    }

    /// Sensor rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.to_raw.rows()
    }

    /// Sensor columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.to_raw.cols()
    }
}

fn parse_entries(text: &str, path: &Path) -> Result<Vec<[i64; 4]>> {
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut entry = [0i64; 4];
        let mut count = 0;
        for token in line.split_whitespace() {
            if count == 4 {
                return Err(IoError::parse(path, idx + 1, "more than 4 values"));
            }
            entry[count] = token.parse().map_err(|_| {
                IoError::parse(path, idx + 1, format!("invalid integer '{}'", token))
            })?;
            count += 1;
        }
        if count != 4 {
            return Err(IoError::parse(
                path,
                idx + 1,
                format!("expected 4 integers, found {}", count),
            ));
        }
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_both_directions() {
        let table = RemapTable::from_rows(4, 4, &[[0, 1, 2, 3], [3, 3, 0, 0]]);
        assert_eq!(table.to_raw(0, 1), Some(PixelCoord::new(2, 3)));
        assert_eq!(table.to_rectified(2, 3), Some(PixelCoord::new(0, 1)));
        assert_eq!(table.to_raw(3, 3), Some(PixelCoord::new(0, 0)));
        assert_eq!(table.to_raw(1, 1), None);
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let table = RemapTable::from_rows(4, 4, &[[0, 0, 1, 1], [-1, 0, 1, 1], [0, 9, 1, 1]]);
        assert_eq!(table.to_raw(4, 0), None);
        assert_eq!(table.to_rectified(0, 100), None);
        assert_eq!(table.to_rectified(1, 1), Some(PixelCoord::new(0, 0)));
    }

    #[test]
    fn test_later_rows_overwrite() {
        let table = RemapTable::from_rows(4, 4, &[[0, 0, 1, 1], [2, 2, 1, 1]]);
        // Both rect pixels still point at raw (1, 1); the reverse keeps the last
        assert_eq!(table.to_raw(0, 0), Some(PixelCoord::new(1, 1)));
        assert_eq!(table.to_rectified(1, 1), Some(PixelCoord::new(2, 2)));
        // so the round trip from (0, 0) is not the identity
        let raw = table.to_raw(0, 0).unwrap();
        assert_ne!(table.to_rectified(raw.row, raw.col), Some(PixelCoord::new(0, 0)));
    }

    #[test]
    fn test_load_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unrectifyLut.txt");
        std::fs::write(&path, "0 0 1 1\n\n1 2 3 0\n").unwrap();
        let table = RemapTable::load_text(&path, 4, 4).unwrap();
        assert_eq!(table.rows(), 4);
        assert_eq!(table.to_raw(1, 2), Some(PixelCoord::new(3, 0)));
    }

    #[test]
    fn test_malformed_line_names_line_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "0 0 1 1\n0 0 1\n").unwrap();
        match RemapTable::load_text(&path, 4, 4) {
            Err(IoError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }

        std::fs::write(&path, "0 0 1 x\n").unwrap();
        assert!(matches!(
            RemapTable::load_text(&path, 4, 4),
            Err(IoError::Parse { line: 1, .. })
        ));

        std::fs::write(&path, "0 0 1 1 5\n").unwrap();
        assert!(RemapTable::load_text(&path, 4, 4).is_err());
    }
}
