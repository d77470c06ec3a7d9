//! Masked CRC32C, as stored in every block trailer.
//!
//! Computing the CRC of a string that itself contains embedded CRCs is
//! problematic, so stored checksums are rotated and offset first.

const MASK_DELTA: u32 = 0xa282_ead8;

pub fn value(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// CRC of `init` continued over `data`.
pub fn extend(init: u32, data: &[u8]) -> u32 {
    crc32c::crc32c_append(init, data)
}

pub fn mask(crc: u32) -> u32 {
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

pub fn unmask(masked: u32) -> u32 {
    let rot = masked.wrapping_sub(MASK_DELTA);
    (rot >> 17) | (rot << 15)
}
