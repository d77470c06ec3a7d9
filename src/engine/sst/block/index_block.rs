use crate::DBError;
use crate::engine::sst::block::{Block, BlockBuilder};
use crate::engine::sst::format::BlockHandle;

/// Builds the index block: one `separator key -> data block handle` entry per
/// data block. Index keys are already sparse, so every entry is a restart
/// point.
pub struct IndexBlockBuilder {
    builder: BlockBuilder,
}

impl IndexBlockBuilder {
    pub fn new() -> Self {
        Self { builder: BlockBuilder::new(1) }
    }

    pub fn add(&mut self, key: &[u8], handle: BlockHandle) {
        log::trace!("index entry {:?} -> {:?}", String::from_utf8_lossy(key), handle);
        self.builder.add(key, &handle.encode());
    }

    /// Number of data blocks indexed so far.
    pub fn len(&self) -> usize {
        self.builder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    pub fn finish(&mut self) -> Vec<u8> {
        self.builder.finish()
    }
}

impl Default for IndexBlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode every entry of an index block in order.
pub fn decode_index_entries(block: &Block) -> Result<Vec<(Vec<u8>, BlockHandle)>, DBError> {
    block
        .iter()
        .map(|entry| {
            let (key, value) = entry?;
            Ok((key, BlockHandle::decode_from_bytes(&value)?))
        })
        .collect()
}
