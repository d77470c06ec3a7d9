// src/engine/sst/table_reader.rs
use std::cmp::Ordering;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::DBError;
use crate::engine::sst::block::{decode_index_entries, find_filter_handle, Block, FilterBlockReader,
                                FilterPolicy};
use crate::engine::sst::format::{read_block, BlockHandle, Footer};
use crate::util::{BytewiseComparator, Comparator};

/// Structural decoder for a finished table: footer, index, meta and filter
/// blocks, and sequential data block reads. Every block read verifies its
/// checksum. There is no caching and no point lookup.
pub struct TableReader<R: Read + Seek> {
    file: R,
    file_len: u64,
    footer: Footer,
    index: Vec<(Vec<u8>, BlockHandle)>,
    filter: Option<FilterBlockReader>,
    comparator: Arc<dyn Comparator>,
}

impl<R: Read + Seek> TableReader<R> {
    /// `filter_policy` must match the policy the table was written with; its
    /// filter block is loaded when the meta block names it.
    pub fn open(mut file: R, filter_policy: Option<Arc<dyn FilterPolicy>>) -> Result<Self, DBError> {
        let file_len = file.seek(SeekFrom::End(0))?;
        let footer = Footer::read_from_file(&mut file, file_len)?;

        let index_block = Block::from_bytes(read_block(&mut file, footer.index_handle)?)?;
        let index = decode_index_entries(&index_block)?;

        let mut filter = None;
        if let Some(policy) = filter_policy {
            let meta = Block::from_bytes(read_block(&mut file, footer.metaindex_handle)?)?;
            if let Some(handle) = find_filter_handle(&meta, policy.name())? {
                let contents = read_block(&mut file, handle)?;
                filter = Some(FilterBlockReader::new(policy, contents)?);
            }
        }

        Ok(Self {
            file,
            file_len,
            footer,
            index,
            filter,
            comparator: Arc::new(BytewiseComparator),
        })
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// `(index key, data block handle)` in file order.
    pub fn index(&self) -> &[(Vec<u8>, BlockHandle)] {
        &self.index
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn read_block(&mut self, handle: BlockHandle) -> Result<Block, DBError> {
        Block::from_bytes(read_block(&mut self.file, handle)?)
    }

    /// Every `(key, value)` of every data block, in order.
    pub fn entries(&mut self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DBError> {
        let handles: Vec<BlockHandle> = self.index.iter().map(|(_, h)| *h).collect();
        let mut out = Vec::new();
        for handle in handles {
            let block = self.read_block(handle)?;
            for entry in block.iter() {
                out.push(entry?);
            }
        }
        Ok(out)
    }

    /// Handle of the only data block that may hold `key`: the first whose
    /// index key is `>= key`.
    pub fn block_for(&self, key: &[u8]) -> Option<BlockHandle> {
        let i = self
            .index
            .partition_point(|(k, _)| self.comparator.compare(k, key) == Ordering::Less);
        self.index.get(i).map(|(_, h)| *h)
    }

    /// `false` only when `key` is definitely absent from the table.
    pub fn may_contain(&self, key: &[u8]) -> bool {
        let Some(handle) = self.block_for(key) else {
            return false;
        };
        match &self.filter {
            Some(filter) => filter.key_may_match(handle.offset, key),
            None => true,
        }
    }
}
