// src/engine/sst/block/block_builder.rs
use crate::util::coding::{put_fixed32, put_varint32};

/// Builds one prefix-compressed block.
///
/// Keys are stored as `[shared][non_shared][value_len][key_delta][value]`
/// against the previous key. Every `restart_interval` entries the full key is
/// stored and its offset recorded in the trailing restart array, which ends
/// with the restart count.
pub struct BlockBuilder {
    restart_interval: usize,
    buf: Vec<u8>,
    restarts: Vec<u32>,
    counter: usize,
    num_entries: usize,
    last_key: Vec<u8>,
}

impl BlockBuilder {
    pub fn new(restart_interval: usize) -> Self {
        assert!(restart_interval >= 1, "restart interval must be at least 1");
        Self {
            restart_interval,
            buf: Vec::new(),
            restarts: vec![0],
            counter: 0,
            num_entries: 0,
            last_key: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Number of entries added since the last reset.
    pub fn len(&self) -> usize {
        self.num_entries
    }

    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        debug_assert!(key.len() <= u32::MAX as usize && value.len() <= u32::MAX as usize);
        debug_assert!(self.buf.len() <= u32::MAX as usize, "block exceeds u32 offsets");
        let mut shared = 0usize;
        if self.counter < self.restart_interval {
            let min_len = self.last_key.len().min(key.len());
            while shared < min_len && self.last_key[shared] == key[shared] {
                shared += 1;
            }
        } else {
            self.restarts.push(self.buf.len() as u32);
            self.counter = 0;
        }

        let non_shared = key.len() - shared;
        put_varint32(&mut self.buf, shared as u32);
        put_varint32(&mut self.buf, non_shared as u32);
        put_varint32(&mut self.buf, value.len() as u32);

        self.buf.extend_from_slice(&key[shared..]);
        self.buf.extend_from_slice(value);

        self.last_key.truncate(shared);
        self.last_key.extend_from_slice(&key[shared..]);
        self.counter += 1;
        self.num_entries += 1;
    }

    /// Append the restart array and hand back the finished block. The builder
    /// must be `reset` before it is reused.
    pub fn finish(&mut self) -> Vec<u8> {
        for &r in &self.restarts {
            put_fixed32(&mut self.buf, r);
        }
        put_fixed32(&mut self.buf, self.restarts.len() as u32);
        std::mem::take(&mut self.buf)
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.restarts.clear();
        self.restarts.push(0);
        self.counter = 0;
        self.num_entries = 0;
        self.last_key.clear();
    }

    /// Size the block would have if finished now.
    pub fn current_size_estimate(&self) -> usize {
        self.buf.len() + self.restarts.len() * 4 + 4
    }
}
