mod block;
mod block_builder;
mod filter_block;
mod filter_block_builder;
mod filter_policy;
mod index_block;
mod metaindex_block;

pub use block::{Block, BlockIter};
pub use block_builder::BlockBuilder;
pub use filter_block::FilterBlockReader;
pub use filter_block_builder::{FilterBlockBuilder, FILTER_BASE, FILTER_BASE_LG};
pub use filter_policy::{BloomFilterPolicy, FilterPolicy};
pub use index_block::{decode_index_entries, IndexBlockBuilder};
pub use metaindex_block::{filter_block_key, find_filter_handle, MetaIndexBlockBuilder};
