use crate::DBError;
use crate::util::coding::{decode_fixed32, get_varint32};

/// A decoded, uncompressed block as produced by `BlockBuilder`.
pub struct Block {
    data: Vec<u8>,
    restarts_offset: usize,
    num_restarts: usize,
}

impl Block {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, DBError> {
        if data.len() < 4 {
            return Err(DBError::Corruption("block too small".into()));
        }
        let num_restarts = decode_fixed32(&data[data.len() - 4..])
            .ok_or_else(|| DBError::Corruption("bad restart count".into()))? as usize;
        let restarts_offset = num_restarts
            .checked_mul(4)
            .and_then(|n| data.len().checked_sub(4 + n))
            .ok_or_else(|| DBError::Corruption("bad restart array".into()))?;

        Ok(Self { data, restarts_offset, num_restarts })
    }

    pub fn num_restarts(&self) -> usize {
        self.num_restarts
    }

    pub fn restart_point(&self, i: usize) -> Option<u32> {
        if i >= self.num_restarts {
            return None;
        }
        decode_fixed32(&self.data[self.restarts_offset + i * 4..])
    }

    pub fn iter(&self) -> BlockIter<'_> {
        BlockIter { data: &self.data[..self.restarts_offset], pos: 0, key: Vec::new(), failed: false }
    }

    /// Exact-match lookup by linear scan.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DBError> {
        for entry in self.iter() {
            let (k, v) = entry?;
            if k == key {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }
}

/// Forward iterator over `(key, value)` pairs. Stops after the first
/// corruption error.
pub struct BlockIter<'a> {
    data: &'a [u8],
    pos: usize,
    key: Vec<u8>,
    failed: bool,
}

impl BlockIter<'_> {
    fn parse_next(&mut self) -> Result<(Vec<u8>, Vec<u8>), DBError> {
        let corrupt = || DBError::Corruption("bad block entry".into());
        let shared = get_varint32(self.data, &mut self.pos).ok_or_else(corrupt)? as usize;
        let non_shared = get_varint32(self.data, &mut self.pos).ok_or_else(corrupt)? as usize;
        let value_len = get_varint32(self.data, &mut self.pos).ok_or_else(corrupt)? as usize;

        if shared > self.key.len() || self.pos + non_shared + value_len > self.data.len() {
            return Err(corrupt());
        }

        self.key.truncate(shared);
        self.key.extend_from_slice(&self.data[self.pos..self.pos + non_shared]);
        self.pos += non_shared;

        let value = self.data[self.pos..self.pos + value_len].to_vec();
        self.pos += value_len;

        Ok((self.key.clone(), value))
    }
}

impl Iterator for BlockIter<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>), DBError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let entry = self.parse_next();
        self.failed = entry.is_err();
        Some(entry)
    }
}
