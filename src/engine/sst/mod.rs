pub mod block;
pub mod compression;
pub mod format;
pub mod table_builder;
pub mod table_reader;

pub use compression::CompressionType;
pub use format::{BlockHandle, Footer, BLOCK_TRAILER_SIZE, TABLE_MAGIC};
pub use table_builder::{TableBuilder, TableSummary};
pub use table_reader::TableReader;
