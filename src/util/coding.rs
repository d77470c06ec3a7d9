// src/util/coding.rs

//! Little-endian fixed-width and varint coding shared by every block format.
//!
//! - `put_*` appends to any `BufMut`
//! - `get_*` reads from `&[u8]` at `pos`, advances `pos`, and returns `None`
//!   on truncated or overlong input instead of panicking

use bytes::BufMut;

pub const MAX_VARINT32_LEN: usize = 5;
pub const MAX_VARINT64_LEN: usize = 10;

#[inline]
pub fn put_fixed32<B: BufMut>(dst: &mut B, v: u32) {
    dst.put_u32_le(v);
}

#[inline]
pub fn put_fixed64<B: BufMut>(dst: &mut B, v: u64) {
    dst.put_u64_le(v);
}

#[inline]
pub fn decode_fixed32(src: &[u8]) -> Option<u32> {
    let b: [u8; 4] = src.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(b))
}

#[inline]
pub fn decode_fixed64(src: &[u8]) -> Option<u64> {
    let b: [u8; 8] = src.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(b))
}

#[inline]
pub fn put_varint32<B: BufMut>(dst: &mut B, v: u32) {
    put_varint64(dst, v as u64);
}

#[inline]
pub fn put_varint64<B: BufMut>(dst: &mut B, mut v: u64) {
    while v >= 0x80 {
        dst.put_u8((v as u8) | 0x80);
        v >>= 7;
    }
    dst.put_u8(v as u8);
}

pub fn varint_length(mut v: u64) -> usize {
    let mut len = 1;
    while v >= 0x80 {
        v >>= 7;
        len += 1;
    }
    len
}

#[inline]
pub fn get_varint32(src: &[u8], pos: &mut usize) -> Option<u32> {
    let mut shift = 0u32;
    let mut out = 0u32;

    while *pos < src.len() && shift <= 28 {
        let b = src[*pos];
        *pos += 1;

        out |= ((b & 0x7f) as u32) << shift;

        if (b & 0x80) == 0 {
            return Some(out);
        }
        shift += 7;
    }
    None
}

#[inline]
pub fn get_varint64(src: &[u8], pos: &mut usize) -> Option<u64> {
    let mut shift = 0u32;
    let mut out = 0u64;

    while *pos < src.len() && shift <= 63 {
        let b = src[*pos];
        *pos += 1;

        out |= ((b & 0x7f) as u64) << shift;

        if (b & 0x80) == 0 {
            return Some(out);
        }
        shift += 7;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed32_64() {
        let mut buf = Vec::new();
        put_fixed32(&mut buf, 0xdead_beef);
        put_fixed64(&mut buf, 0x0123_4567_89ab_cdef);
        assert_eq!(buf.len(), 12);
        assert_eq!(buf[0], 0xef);
        assert_eq!(decode_fixed32(&buf), Some(0xdead_beef));
        assert_eq!(decode_fixed64(&buf[4..]), Some(0x0123_4567_89ab_cdef));
        assert_eq!(decode_fixed32(&buf[10..]), None);
    }

    #[test]
    fn test_varint64_boundaries() {
        for &v in &[0u64, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            put_varint64(&mut buf, v);
            assert_eq!(buf.len(), varint_length(v));
            let mut pos = 0usize;
            assert_eq!(get_varint64(&buf, &mut pos), Some(v));
            assert_eq!(pos, buf.len());
        }
        let mut buf = Vec::new();
        put_varint64(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT64_LEN);
    }

    #[test]
    fn test_varint32_max_len() {
        let mut buf = Vec::new();
        put_varint32(&mut buf, u32::MAX);
        assert_eq!(buf.len(), MAX_VARINT32_LEN);
        let mut pos = 0;
        assert_eq!(get_varint32(&buf, &mut pos), Some(u32::MAX));
    }

    #[test]
    fn test_truncated_varint_is_none() {
        let mut buf = Vec::new();
        put_varint64(&mut buf, 1 << 40);
        buf.pop();
        let mut pos = 0;
        assert_eq!(get_varint64(&buf, &mut pos), None);

        let mut pos = 0;
        assert_eq!(get_varint32(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01], &mut pos), None);
    }
}
