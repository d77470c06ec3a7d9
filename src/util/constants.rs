pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024;
pub const DEFAULT_RESTART_INTERVAL: usize = 16;
pub const DEFAULT_BLOOM_BITS_PER_KEY: usize = 10;
pub const MIN_BLOCK_SIZE: usize = 64;

pub const LOCK_FILE: &str = "LOCK";
pub const CURRENT_FILE: &str = "CURRENT";
pub const TABLE_CONFIG_BASENAME: &str = "table";
