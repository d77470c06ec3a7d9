use std::sync::Arc;

use crate::DBError;
use crate::engine::sst::block::FilterPolicy;
use crate::util::coding::decode_fixed32;

/// Read side of the filter block written by `FilterBlockBuilder`.
pub struct FilterBlockReader {
    policy: Arc<dyn FilterPolicy>,
    data: Vec<u8>,
    offsets_start: usize,
    num: usize,
    base_lg: u8,
}

impl FilterBlockReader {
    pub fn new(policy: Arc<dyn FilterPolicy>, data: Vec<u8>) -> Result<Self, DBError> {
        // 4 byte array offset + 1 byte base_lg
        if data.len() < 5 {
            return Err(DBError::Corruption("filter block too small".into()));
        }
        let n = data.len();
        let base_lg = data[n - 1];
        if u32::from(base_lg) >= u64::BITS {
            return Err(DBError::Corruption(format!("bad filter base_lg: {base_lg}")));
        }
        let offsets_start = decode_fixed32(&data[n - 5..])
            .ok_or_else(|| DBError::Corruption("bad filter offset array".into()))?
            as usize;
        if offsets_start > n - 5 {
            return Err(DBError::Corruption("filter offset array out of range".into()));
        }
        let num = (n - 5 - offsets_start) / 4;

        Ok(Self { policy, data, offsets_start, num, base_lg })
    }

    pub fn num_filters(&self) -> usize {
        self.num
    }

    /// Probe the filter covering the data block at `block_offset`. Anything
    /// that cannot be decoded is treated as a potential match.
    pub fn key_may_match(&self, block_offset: u64, key: &[u8]) -> bool {
        let index = (block_offset >> self.base_lg) as usize;
        if index >= self.num {
            return true;
        }

        let at = self.offsets_start + index * 4;
        let (Some(start), Some(limit)) =
            (decode_fixed32(&self.data[at..]), decode_fixed32(&self.data[at + 4..]))
        else {
            return true;
        };
        let (start, limit) = (start as usize, limit as usize);

        if start == limit {
            // empty filters match nothing
            return false;
        }
        if start < limit && limit <= self.offsets_start {
            return self.policy.key_may_match(key, &self.data[start..limit]);
        }
        true
    }
}
