pub mod coding;
pub mod comparator;
pub mod constants;
pub mod crc;
mod options;
mod table_config_file;

pub use comparator::{BytewiseComparator, Comparator};
pub use constants::{DEFAULT_BLOCK_SIZE, DEFAULT_BLOOM_BITS_PER_KEY, DEFAULT_RESTART_INTERVAL,
                    MIN_BLOCK_SIZE};
pub use options::TableOptions;
pub use table_config_file::{load_table_config, TableConfigFile};
