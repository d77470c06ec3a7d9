use std::sync::Arc;

use crate::engine::sst::block::FilterPolicy;
use crate::util::coding::put_fixed32;

/// Generate a new filter every 2KB of data-block offsets.
pub const FILTER_BASE_LG: u8 = 11;
pub const FILTER_BASE: u64 = 1 << FILTER_BASE_LG;

/// Collects keys per data block and emits the table-level filter block.
///
/// Filter `i` covers every data block whose file offset falls in
/// `[i * FILTER_BASE, (i + 1) * FILTER_BASE)`, so a reader maps a block
/// offset to its filter with a shift. Layout:
///
/// ```text
/// [filter 0]...[filter n-1]
/// [offset of filter 0: u32]...[offset of filter n-1: u32]
/// [offset of the offset array: u32]
/// [FILTER_BASE_LG: u8]
/// ```
pub struct FilterBlockBuilder {
    policy: Arc<dyn FilterPolicy>,
    keys: Vec<u8>,          // flattened key contents
    starts: Vec<usize>,     // start of each key in `keys`
    result: Vec<u8>,        // filters generated so far
    filter_offsets: Vec<u32>,
}

impl FilterBlockBuilder {
    pub fn new(policy: Arc<dyn FilterPolicy>) -> Self {
        Self {
            policy,
            keys: Vec::new(),
            starts: Vec::new(),
            result: Vec::new(),
            filter_offsets: Vec::new(),
        }
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Seal filters up to the bucket containing `block_offset`, the offset at
    /// which the next data block starts. Keys added since the previous call
    /// land in the first sealed filter.
    pub fn start_block(&mut self, block_offset: u64) {
        let filter_index = (block_offset / FILTER_BASE) as usize;
        debug_assert!(filter_index >= self.filter_offsets.len());
        while filter_index > self.filter_offsets.len() {
            self.generate_filter();
        }
    }

    pub fn add_key(&mut self, key: &[u8]) {
        self.starts.push(self.keys.len());
        self.keys.extend_from_slice(key);
    }

    pub fn finish(mut self) -> Vec<u8> {
        if !self.starts.is_empty() {
            self.generate_filter();
        }

        let array_offset = self.result.len() as u32;
        for &off in &self.filter_offsets {
            put_fixed32(&mut self.result, off);
        }
        put_fixed32(&mut self.result, array_offset);
        self.result.push(FILTER_BASE_LG);
        self.result
    }

    fn generate_filter(&mut self) {
        self.filter_offsets.push(self.result.len() as u32);
        if self.starts.is_empty() {
            // empty bucket: zero-length filter
            return;
        }

        let key_refs: Vec<&[u8]> = self
            .starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = self.starts.get(i + 1).copied().unwrap_or(self.keys.len());
                &self.keys[start..end]
            })
            .collect();
        let filter = self.policy.create_filter(&key_refs);
        self.result.extend_from_slice(&filter);

        self.keys.clear();
        self.starts.clear();
    }
}
