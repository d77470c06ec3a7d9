use serde::Deserialize;

use crate::DBError;

/// Block compression, stored as the one-byte tag in every block trailer.
/// Written to disk; don't renumber.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    None = 0,
    #[default]
    Snappy = 1,
}

impl TryFrom<u8> for CompressionType {
    type Error = DBError;

    fn try_from(value: u8) -> Result<Self, DBError> {
        match value {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Snappy),
            _ => Err(DBError::Corruption(format!("unknown compression type: {value}"))),
        }
    }
}

/// Compress `raw` for storage. Returns `None` when the block should be stored
/// uncompressed: compression is off, or it saves less than 12.5%.
pub fn compress_block(raw: &[u8], compression: CompressionType) -> Result<Option<Vec<u8>>, DBError> {
    match compression {
        CompressionType::None => Ok(None),
        CompressionType::Snappy => {
            let compressed = snap::raw::Encoder::new()
                .compress_vec(raw)
                .map_err(|e| DBError::Compression(format!("snappy compression failed: {e}")))?;
            if compressed.len() < raw.len() - raw.len() / 8 {
                Ok(Some(compressed))
            } else {
                Ok(None)
            }
        }
    }
}

pub fn decompress_block(data: &[u8], compression: CompressionType) -> Result<Vec<u8>, DBError> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Snappy => snap::raw::Decoder::new()
            .decompress_vec(data)
            .map_err(|e| DBError::Corruption(format!("snappy decompression failed: {e}"))),
    }
}
