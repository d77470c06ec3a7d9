use std::io::{Read, Seek, SeekFrom};

use crate::DBError;
use crate::engine::sst::compression::{decompress_block, CompressionType};
use crate::util::coding::{decode_fixed32, decode_fixed64, get_varint64, put_fixed64,
                          put_varint64, MAX_VARINT64_LEN};
use crate::util::crc;

/// 1 byte compression type + 4 byte masked crc32c
pub const BLOCK_TRAILER_SIZE: usize = 5;

/// "SSTKV1" + format version 1. Written to disk; bump the version on any
/// footer layout change.
pub const TABLE_MAGIC: u64 = 0x5353_544B_5631_0001;

/// Location of a block inside a table file. `size` excludes the trailer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u64,
}

impl BlockHandle {
    pub const MAX_ENCODED_LEN: usize = 2 * MAX_VARINT64_LEN;

    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        put_varint64(dst, self.offset);
        put_varint64(dst, self.size);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(Self::MAX_ENCODED_LEN);
        self.encode_to(&mut v);
        v
    }

    pub fn decode_from(src: &[u8], pos: &mut usize) -> Option<Self> {
        let offset = get_varint64(src, pos)?;
        let size = get_varint64(src, pos)?;
        Some(Self { offset, size })
    }

    pub fn decode_from_bytes(bytes: &[u8]) -> Result<Self, DBError> {
        let mut pos = 0usize;
        Self::decode_from(bytes, &mut pos)
            .ok_or_else(|| DBError::Corruption("bad block handle".into()))
    }
}

/// Fixed-size table trailer:
///
/// ```text
/// [metaindex handle][index handle][zero padding to 40 bytes][magic u64 le]
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Footer {
    pub metaindex_handle: BlockHandle,
    pub index_handle: BlockHandle,
}

impl Footer {
    pub const ENCODED_LEN: usize = 2 * BlockHandle::MAX_ENCODED_LEN + 8;

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        self.metaindex_handle.encode_to(&mut buf);
        self.index_handle.encode_to(&mut buf);
        buf.resize(2 * BlockHandle::MAX_ENCODED_LEN, 0);
        put_fixed64(&mut buf, TABLE_MAGIC);

        let mut out = [0u8; Self::ENCODED_LEN];
        out.copy_from_slice(&buf);
        out
    }

    pub fn decode(input: &[u8]) -> Result<Self, DBError> {
        if input.len() != Self::ENCODED_LEN {
            return Err(DBError::Corruption(format!(
                "footer must be {} bytes, got {}",
                Self::ENCODED_LEN,
                input.len()
            )));
        }
        let magic = decode_fixed64(&input[Self::ENCODED_LEN - 8..])
            .ok_or_else(|| DBError::Corruption("truncated footer".into()))?;
        if magic != TABLE_MAGIC {
            return Err(DBError::Corruption(format!(
                "bad table magic: expected {:#x}, got {:#x}",
                TABLE_MAGIC, magic
            )));
        }

        let handles = &input[..Self::ENCODED_LEN - 8];
        let mut pos = 0usize;
        let metaindex_handle = BlockHandle::decode_from(handles, &mut pos)
            .ok_or_else(|| DBError::Corruption("bad metaindex handle".into()))?;
        let index_handle = BlockHandle::decode_from(handles, &mut pos)
            .ok_or_else(|| DBError::Corruption("bad index handle".into()))?;

        Ok(Self { metaindex_handle, index_handle })
    }

    pub fn read_from_file<R>(reader: &mut R, file_len: u64) -> Result<Self, DBError>
    where
        R: Read + Seek,
    {
        if file_len < Self::ENCODED_LEN as u64 {
            return Err(DBError::Corruption("file too short to be an sstable".into()));
        }

        reader.seek(SeekFrom::Start(file_len - Self::ENCODED_LEN as u64))?;
        let mut buf = [0u8; Self::ENCODED_LEN];
        reader.read_exact(&mut buf)?;
        Self::decode(&buf)
    }
}

/// Check the trailer of a stored block and return its uncompressed contents.
/// `stored` is the payload immediately followed by its trailer.
pub fn decode_block(stored: &[u8]) -> Result<Vec<u8>, DBError> {
    if stored.len() < BLOCK_TRAILER_SIZE {
        return Err(DBError::Corruption("truncated block read".into()));
    }
    let n = stored.len() - BLOCK_TRAILER_SIZE;
    let payload = &stored[..n];
    let tag = stored[n];

    let expected = decode_fixed32(&stored[n + 1..])
        .map(crc::unmask)
        .ok_or_else(|| DBError::Corruption("truncated block trailer".into()))?;
    let actual = crc::value(&stored[..n + 1]);
    if actual != expected {
        return Err(DBError::Corruption(format!(
            "block checksum mismatch: expected {expected:#010x}, got {actual:#010x}"
        )));
    }

    decompress_block(payload, CompressionType::try_from(tag)?)
}

/// Read the block at `handle` from `reader`, verifying its checksum.
pub fn read_block<R>(reader: &mut R, handle: BlockHandle) -> Result<Vec<u8>, DBError>
where
    R: Read + Seek,
{
    let len = usize::try_from(handle.size)
        .map_err(|_| DBError::Corruption("block handle size overflows usize".into()))?;
    let mut buf = vec![0u8; len + BLOCK_TRAILER_SIZE];
    reader.seek(SeekFrom::Start(handle.offset))?;
    reader.read_exact(&mut buf)?;
    decode_block(&buf)
}

/// Same as `read_block`, over an in-memory table image.
pub fn block_from_slice(file: &[u8], handle: BlockHandle) -> Result<Vec<u8>, DBError> {
    let start = handle.offset as usize;
    let end = start
        .checked_add(handle.size as usize)
        .and_then(|end| end.checked_add(BLOCK_TRAILER_SIZE))
        .filter(|&end| end <= file.len())
        .ok_or_else(|| DBError::Corruption("block handle past end of file".into()))?;
    decode_block(&file[start..end])
}
