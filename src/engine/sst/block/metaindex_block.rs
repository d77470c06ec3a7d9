use crate::DBError;
use crate::engine::sst::block::{Block, BlockBuilder};
use crate::engine::sst::format::BlockHandle;

/// Meta block key under which a filter block is registered.
pub fn filter_block_key(policy_name: &str) -> String {
    format!("filter.{policy_name}")
}

/// Builds the meta block: `name -> BlockHandle`, names added in sorted order.
pub struct MetaIndexBlockBuilder {
    builder: BlockBuilder,
    last_key: Vec<u8>,
}

impl MetaIndexBlockBuilder {
    pub fn new(restart_interval: usize) -> Self {
        Self {
            builder: BlockBuilder::new(restart_interval),
            last_key: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str, handle: BlockHandle) {
        let k = name.as_bytes();
        debug_assert!(
            self.builder.is_empty() || k > self.last_key.as_slice(),
            "meta block names must be added in sorted order"
        );
        self.last_key.clear();
        self.last_key.extend_from_slice(k);

        self.builder.add(k, &handle.encode());
    }

    pub fn add_filter_block(&mut self, policy_name: &str, handle: BlockHandle) {
        self.add(&filter_block_key(policy_name), handle);
    }

    pub fn finish(&mut self) -> Vec<u8> {
        self.builder.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }
}

/// Look up the filter block handle registered for `policy_name`.
pub fn find_filter_handle(meta: &Block, policy_name: &str) -> Result<Option<BlockHandle>, DBError> {
    match meta.get(filter_block_key(policy_name).as_bytes())? {
        Some(v) => Ok(Some(BlockHandle::decode_from_bytes(&v)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_handle_lookup() {
        let mut b = MetaIndexBlockBuilder::new(16);
        let h = BlockHandle { offset: 4242, size: 99 };
        b.add_filter_block("sstkv.BuiltinBloomFilter", h);
        b.add("properties", BlockHandle { offset: 1, size: 2 });

        let block = Block::from_bytes(b.finish()).unwrap();
        assert_eq!(find_filter_handle(&block, "sstkv.BuiltinBloomFilter").unwrap(), Some(h));
        assert_eq!(find_filter_handle(&block, "other").unwrap(), None);
    }
}
