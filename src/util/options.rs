use std::fmt;
use std::sync::Arc;

use crate::DBError;
use crate::engine::sst::block::FilterPolicy;
use crate::engine::sst::CompressionType;
use crate::util::{BytewiseComparator, Comparator, DEFAULT_BLOCK_SIZE, DEFAULT_RESTART_INTERVAL,
                  MIN_BLOCK_SIZE};

/// Options consumed by `TableBuilder`; read-only for the builder's lifetime.
#[derive(Clone)]
pub struct TableOptions {
    /// Uncompressed data block size at which a block is flushed.
    pub block_size: usize,

    /// Number of keys between restart points in data and meta blocks.
    pub block_restart_interval: usize,

    pub compression: CompressionType,

    pub comparator: Arc<dyn Comparator>,

    /// No filter block is written when `None`.
    pub filter_policy: Option<Arc<dyn FilterPolicy>>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            block_restart_interval: DEFAULT_RESTART_INTERVAL,
            compression: CompressionType::default(),
            comparator: Arc::new(BytewiseComparator),
            filter_policy: None,
        }
    }
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("block_size", &self.block_size)
            .field("block_restart_interval", &self.block_restart_interval)
            .field("compression", &self.compression)
            .field("comparator", &self.comparator.name())
            .field("filter_policy", &self.filter_policy.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

impl TableOptions {
    pub fn with_filter_policy(mut self, policy: Arc<dyn FilterPolicy>) -> Self {
        self.filter_policy = Some(policy);
        self
    }

    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn validate(&self) -> Result<(), DBError> {
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(DBError::InvalidArgument(format!(
                "block_size {} below minimum {}",
                self.block_size, MIN_BLOCK_SIZE
            )));
        }
        if self.block_restart_interval == 0 {
            return Err(DBError::InvalidArgument(
                "block_restart_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let opts = TableOptions::default();
        assert!(opts.validate().is_ok());
        assert_eq!(opts.block_size, 4096);
        assert_eq!(opts.block_restart_interval, 16);
        assert_eq!(opts.compression, CompressionType::Snappy);
        assert!(opts.filter_policy.is_none());
    }

    #[test]
    fn rejects_bad_sizes() {
        let opts = TableOptions::default().with_block_size(8);
        assert!(matches!(opts.validate(), Err(DBError::InvalidArgument(_))));

        let mut opts = TableOptions::default();
        opts.block_restart_interval = 0;
        assert!(matches!(opts.validate(), Err(DBError::InvalidArgument(_))));
    }
}
