use std::path::Path;
use std::sync::Arc;

use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::DBError;
use crate::engine::sst::block::BloomFilterPolicy;
use crate::engine::sst::CompressionType;
use crate::util::{TableOptions, DEFAULT_BLOOM_BITS_PER_KEY};
use crate::util::constants::TABLE_CONFIG_BASENAME;

/// On-disk overrides for `TableOptions`. Every field is optional; missing
/// fields keep their defaults.
#[derive(Debug, Deserialize, Default)]
pub struct TableConfigFile {
    pub block_size: Option<usize>,
    pub block_restart_interval: Option<usize>,
    pub compression: Option<CompressionType>,

    /// Enables the bloom filter block. `0` keeps it disabled.
    pub bloom_bits_per_key: Option<usize>,
}

/// Load `table.yaml`, `table.json` or `table.ini` from `dir`, first match
/// wins. An empty config is returned when none of them exist.
pub fn load_table_config(dir: &Path) -> Result<TableConfigFile, DBError> {
    let mut cfg = Config::builder();

    let candidates = [
        ("yaml", FileFormat::Yaml),
        ("json", FileFormat::Json),
        ("ini", FileFormat::Ini),
    ];
    for (ext, format) in candidates {
        let path = dir.join(format!("{TABLE_CONFIG_BASENAME}.{ext}"));
        if path.exists() {
            log::debug!("loading table config from {}", path.display());
            cfg = cfg.add_source(File::from(path.as_path()).format(format));
            break;
        }
    }

    let cfg = cfg.build()?;
    Ok(cfg.try_deserialize()?)
}

impl TableConfigFile {
    pub fn to_table_options(self) -> Result<TableOptions, DBError> {
        let mut opts = TableOptions::default();

        macro_rules! apply {
            ($f:ident) => {
                if let Some(v) = self.$f {
                    opts.$f = v;
                }
            };
        }

        apply!(block_size);
        apply!(block_restart_interval);
        apply!(compression);

        if let Some(bits) = self.bloom_bits_per_key.filter(|&b| b > 0) {
            opts.filter_policy = Some(Arc::new(BloomFilterPolicy::new(bits)));
        }

        opts.validate()?;
        Ok(opts)
    }

    /// Same as `to_table_options`, but turns the bloom filter on with the
    /// default bits-per-key when the file does not mention it.
    pub fn to_table_options_with_default_filter(mut self) -> Result<TableOptions, DBError> {
        if self.bloom_bits_per_key.is_none() {
            self.bloom_bits_per_key = Some(DEFAULT_BLOOM_BITS_PER_KEY);
        }
        self.to_table_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_config_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let opts = load_table_config(dir.path()).unwrap().to_table_options().unwrap();
        assert_eq!(opts.block_size, 4096);
        assert!(opts.filter_policy.is_none());
    }

    #[test]
    fn yaml_overrides_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("table.yaml"),
            "block_size: 8192\ncompression: none\nbloom_bits_per_key: 12\n",
        )
        .unwrap();

        let opts = load_table_config(dir.path()).unwrap().to_table_options().unwrap();
        assert_eq!(opts.block_size, 8192);
        assert_eq!(opts.block_restart_interval, 16);
        assert_eq!(opts.compression, CompressionType::None);
        assert_eq!(
            opts.filter_policy.as_ref().map(|p| p.name().to_string()),
            Some("sstkv.BuiltinBloomFilter".to_string())
        );
    }

    #[test]
    fn yaml_wins_over_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("table.yaml"), "block_size: 1024\n").unwrap();
        fs::write(dir.path().join("table.json"), r#"{"block_size": 2048}"#).unwrap();

        let cfg = load_table_config(dir.path()).unwrap();
        assert_eq!(cfg.block_size, Some(1024));
    }

    #[test]
    fn json_invalid_restart_interval_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("table.json"), r#"{"block_restart_interval": 0}"#).unwrap();

        let err = load_table_config(dir.path()).unwrap().to_table_options().unwrap_err();
        assert!(matches!(err, DBError::InvalidArgument(_)));
    }

    #[test]
    fn default_filter_applies_when_unset() {
        let opts = TableConfigFile::default().to_table_options_with_default_filter().unwrap();
        assert!(opts.filter_policy.is_some());

        let cfg = TableConfigFile { bloom_bits_per_key: Some(0), ..Default::default() };
        assert!(cfg.to_table_options_with_default_filter().unwrap().filter_policy.is_none());
    }
}
