//! Spatial hashing primitives for the sharded voxel map.
//!
//! Morton (Z-order) codes interleave the bits of the three voxel indices so
//! that nearby cells map to nearby codes. The map uses them to spread
//! coordinates over its shards.

use crate::types::VoxelCoord;

/// Offset that moves signed indices into the unsigned 21-bit Morton range.
const SIGNED_OFFSET: i32 = 1 << 20;

/// Spread the lower 21 bits of `x` so two zero bits separate each input bit.
///
/// Input:  ...xxxxx xxxxxxxx xxxxxxxx (21 bits)
/// Output: ..x..x..x..x..x ... ..x..x (63 bits)
#[inline]
pub fn spread_bits_3d(x: u32) -> u64 {
    let mut x = (x & 0x1FFFFF) as u64;
    x = (x | (x << 32)) & 0x1F00000000FFFF;
    x = (x | (x << 16)) & 0x1F0000FF0000FF;
    x = (x | (x << 8)) & 0x100F00F00F00F00F;
    x = (x | (x << 4)) & 0x10C30C30C30C30C3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Inverse of [`spread_bits_3d`].
#[inline]
pub fn compact_bits_3d(mut x: u64) -> u32 {
    x &= 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10C30C30C30C30C3;
    x = (x | (x >> 4)) & 0x100F00F00F00F00F;
    x = (x | (x >> 8)) & 0x1F0000FF0000FF;
    x = (x | (x >> 16)) & 0x1F00000000FFFF;
    x = (x | (x >> 32)) & 0x1FFFFF;
    x as u32
}

/// Morton encode three unsigned 21-bit indices into a 63-bit code.
///
/// Bits are interleaved as `z2y2x2 z1y1x1 z0y0x0`.
#[inline]
pub fn morton_encode_3d(x: u32, y: u32, z: u32) -> u64 {
    spread_bits_3d(x) | (spread_bits_3d(y) << 1) | (spread_bits_3d(z) << 2)
}

/// Inverse of [`morton_encode_3d`].
#[inline]
pub fn morton_decode_3d(code: u64) -> (u32, u32, u32) {
    (
        compact_bits_3d(code),
        compact_bits_3d(code >> 1),
        compact_bits_3d(code >> 2),
    )
}

/// Morton encode a signed voxel coordinate.
///
/// Exact for indices in `[-2^20, 2^20)`; beyond that range the upper bits
/// are dropped, which is harmless for shard selection.
#[inline]
pub fn morton_encode_signed(coord: VoxelCoord) -> u64 {
    let x = coord.x.wrapping_add(SIGNED_OFFSET) as u32;
    let y = coord.y.wrapping_add(SIGNED_OFFSET) as u32;
    let z = coord.z.wrapping_add(SIGNED_OFFSET) as u32;
    morton_encode_3d(x, y, z)
}

/// Inverse of [`morton_encode_signed`] within the exact range.
#[inline]
pub fn morton_decode_signed(code: u64) -> VoxelCoord {
    let (x, y, z) = morton_decode_3d(code);
    VoxelCoord::new(
        (x as i32).wrapping_sub(SIGNED_OFFSET),
        (y as i32).wrapping_sub(SIGNED_OFFSET),
        (z as i32).wrapping_sub(SIGNED_OFFSET),
    )
}

/// Shard owning `coord` for a map with `shard_count` shards.
///
/// `shard_count` must be a power of two. The code is mixed before masking so
/// neighbouring cells (which share their low Morton bits) still fan out over
/// different shards.
#[inline]
pub fn shard_index(coord: VoxelCoord, shard_count: usize) -> usize {
    debug_assert!(shard_count.is_power_of_two());
    let code = morton_encode_signed(coord);
    // Fibonacci hashing of the Morton code
    let mixed = code.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    (mixed >> 32) as usize & (shard_count - 1)
}
