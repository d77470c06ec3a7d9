// src/engine/sst/table_builder.rs
use std::cmp::Ordering;
use std::io::Write;

use crate::DBError;
use crate::engine::sst::block::{BlockBuilder, FilterBlockBuilder, IndexBlockBuilder, MetaIndexBlockBuilder};
use crate::engine::sst::compression::{compress_block, CompressionType};
use crate::engine::sst::format::{BlockHandle, Footer, BLOCK_TRAILER_SIZE};
use crate::util::{crc, TableOptions};

/// Handle of the last flushed data block, waiting for the first key of the
/// next block so the shortest separator between the two can be indexed.
struct PendingIndex {
    handle: BlockHandle,
    last_key: Vec<u8>,
}

/// What `TableBuilder::finish` leaves behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSummary {
    pub num_entries: u64,
    /// Exact length of the table file.
    pub file_size: u64,
    pub num_data_blocks: usize,
    pub metaindex_handle: BlockHandle,
    pub index_handle: BlockHandle,
    pub filter_handle: Option<BlockHandle>,
}

/// Writes a sorted table to `w`.
///
/// File layout:
///
/// ```text
/// [data block 0]...[data block n-1]
/// [filter block]          raw, only with a filter policy
/// [meta block]            "filter.<policy>" -> filter block handle
/// [index block]           separator key -> data block handle
/// [footer]                Footer::ENCODED_LEN bytes
/// ```
///
/// Every block is followed by a one byte compression tag and the masked
/// crc32c of payload and tag.
///
/// Keys must be added in strictly increasing comparator order. `finish`
/// consumes the builder; after any write error the builder is unusable and
/// further calls panic. The sink is never closed or synced here.
pub struct TableBuilder<W: Write> {
    w: W,
    options: TableOptions,
    offset: u64,
    num_entries: u64,

    data_block: BlockBuilder,
    index_block: IndexBlockBuilder,
    filter_block: Option<FilterBlockBuilder>,

    last_key: Vec<u8>,
    pending_index: Option<PendingIndex>,
    poisoned: bool,
}

impl<W: Write> TableBuilder<W> {
    pub fn new(options: TableOptions, w: W) -> Result<Self, DBError> {
        options.validate()?;

        let filter_block = options.filter_policy.clone().map(|policy| {
            let mut fb = FilterBlockBuilder::new(policy);
            fb.start_block(0);
            fb
        });

        Ok(Self {
            w,
            data_block: BlockBuilder::new(options.block_restart_interval),
            index_block: IndexBlockBuilder::new(),
            filter_block,
            options,
            offset: 0,
            num_entries: 0,
            last_key: Vec::new(),
            pending_index: None,
            poisoned: false,
        })
    }

    /// Append a pair. Keys and values longer than `u32::MAX` bytes are
    /// rejected with `InvalidArgument` before anything is buffered.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<(), DBError> {
        self.check_usable();
        check_entry_len(key.len(), value.len())?;
        debug_assert!(
            self.num_entries == 0
                || self.options.comparator.compare(key, &self.last_key) == Ordering::Greater,
            "keys must be added in strictly increasing order"
        );

        if let Some(pending) = self.pending_index.take() {
            let sep = self.options.comparator.separator(&pending.last_key, key);
            self.index_block.add(&sep, pending.handle);
        }

        if let Some(fb) = self.filter_block.as_mut() {
            fb.add_key(key);
        }

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.num_entries += 1;

        self.data_block.add(key, value);
        if self.data_block.current_size_estimate() >= self.options.block_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Seal and write the current data block. A no-op when nothing was added
    /// since the last flush.
    pub fn flush(&mut self) -> Result<(), DBError> {
        self.check_usable();
        if self.pending_index.is_some() || self.data_block.is_empty() {
            return Ok(());
        }

        let entries = self.data_block.len();
        let raw = self.data_block.finish();
        let handle = self.write_block(&raw, false)?;
        self.data_block.reset();

        log::debug!(
            "flushed data block #{} at offset {} ({} entries, {} -> {} bytes)",
            self.index_block.len(),
            handle.offset,
            entries,
            raw.len(),
            handle.size
        );

        self.pending_index = Some(PendingIndex { handle, last_key: self.last_key.clone() });

        if let Some(fb) = self.filter_block.as_mut() {
            fb.start_block(self.offset);
        }
        Ok(())
    }

    /// Write the remaining blocks and the footer. A failed `finish` leaves a
    /// truncated file behind that the caller must discard.
    pub fn finish(mut self) -> Result<TableSummary, DBError> {
        self.flush()?;

        let mut filter_handle = None;
        let mut meta = MetaIndexBlockBuilder::new(self.options.block_restart_interval);
        if let Some(fb) = self.filter_block.take() {
            let name = fb.policy_name().to_string();
            let contents = fb.finish();
            let handle = self.write_block(&contents, true)?;
            meta.add_filter_block(&name, handle);
            filter_handle = Some(handle);
        }
        let meta_contents = meta.finish();
        let metaindex_handle = self.write_block(&meta_contents, false)?;

        if let Some(pending) = self.pending_index.take() {
            let succ = self.options.comparator.successor(&pending.last_key);
            self.index_block.add(&succ, pending.handle);
        }
        let index_contents = self.index_block.finish();
        let index_handle = self.write_block(&index_contents, false)?;

        let footer = Footer { metaindex_handle, index_handle };
        self.w.write_all(&footer.encode())?;
        self.offset += Footer::ENCODED_LEN as u64;
        self.w.flush()?;

        let summary = TableSummary {
            num_entries: self.num_entries,
            file_size: self.offset,
            num_data_blocks: self.index_block.len(),
            metaindex_handle,
            index_handle,
            filter_handle,
        };
        log::info!(
            "table finished: {} entries, {} data blocks, {} bytes",
            summary.num_entries,
            summary.num_data_blocks,
            summary.file_size
        );
        Ok(summary)
    }

    /// Number of key/value pairs added so far.
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    /// Bytes written to the sink so far; buffered block data is not counted.
    pub fn file_size(&self) -> u64 {
        self.offset
    }

    /// Data blocks written so far, plus the open block if it holds entries.
    pub fn num_data_blocks(&self) -> usize {
        self.index_block.len()
            + usize::from(self.pending_index.is_some())
            + usize::from(!self.data_block.is_empty())
    }

    fn check_usable(&self) {
        assert!(!self.poisoned, "operation on failed table builder");
    }

    fn write_block(&mut self, contents: &[u8], raw: bool) -> Result<BlockHandle, DBError> {
        let res = self.write_raw_block(contents, raw);
        if let Err(e) = &res {
            self.poisoned = true;
            log::warn!("table write failed at offset {}: {}", self.offset, e);
        }
        res
    }

    fn write_raw_block(&mut self, contents: &[u8], raw: bool) -> Result<BlockHandle, DBError> {
        let compressed = if raw {
            None
        } else {
            compress_block(contents, self.options.compression)?
        };
        let (payload, compression) = match compressed.as_deref() {
            Some(c) => (c, self.options.compression),
            None => (contents, CompressionType::None),
        };

        let handle = BlockHandle { offset: self.offset, size: payload.len() as u64 };

        let mut trailer = [0u8; BLOCK_TRAILER_SIZE];
        trailer[0] = compression as u8;
        let checksum = crc::mask(crc::extend(crc::value(payload), &trailer[..1]));
        trailer[1..].copy_from_slice(&checksum.to_le_bytes());

        self.w.write_all(payload)?;
        self.w.write_all(&trailer)?;
        self.offset += (payload.len() + BLOCK_TRAILER_SIZE) as u64;

        Ok(handle)
    }
}

/// Block entries store lengths as varint32.
fn check_entry_len(key_len: usize, value_len: usize) -> Result<(), DBError> {
    if u32::try_from(key_len).is_err() || u32::try_from(value_len).is_err() {
        return Err(DBError::InvalidArgument(format!(
            "entry too large: key {key_len} bytes, value {value_len} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    use crate::engine::sst::block::{decode_index_entries, Block, BloomFilterPolicy};
    use crate::engine::sst::format::block_from_slice;

    fn plain_options(block_size: usize) -> TableOptions {
        TableOptions::default()
            .with_block_size(block_size)
            .with_compression(CompressionType::None)
    }

    fn index_of(file: &[u8], summary: &TableSummary) -> Vec<(Vec<u8>, BlockHandle)> {
        let block = Block::from_bytes(block_from_slice(file, summary.index_handle).unwrap()).unwrap();
        decode_index_entries(&block).unwrap()
    }

    /// Accepts `budget` bytes, then fails every write.
    struct FailingWriter {
        written: Vec<u8>,
        budget: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.budget {
                return Err(io::Error::other("disk full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn index_entry_is_deferred_until_next_key() {
        let mut out = Vec::new();
        let mut tb = TableBuilder::new(plain_options(4096), &mut out).unwrap();

        tb.add(b"abcd", b"1").unwrap();
        tb.flush().unwrap();
        assert!(tb.pending_index.is_some());
        assert_eq!(tb.index_block.len(), 0);

        tb.add(b"abzz", b"2").unwrap();
        assert!(tb.pending_index.is_none());
        assert_eq!(tb.index_block.len(), 1);

        let summary = tb.finish().unwrap();
        let index = index_of(&out, &summary);
        assert_eq!(index.len(), 2);
        // shortened separator and successor
        assert_eq!(index[0].0, b"abd".to_vec());
        assert_eq!(index[1].0, b"b".to_vec());
        assert_eq!(index[0].1.offset, 0);
    }

    #[test]
    fn flush_is_idempotent() {
        let mut out = Vec::new();
        let mut tb = TableBuilder::new(plain_options(4096), &mut out).unwrap();
        tb.flush().unwrap();
        assert_eq!(tb.file_size(), 0);

        tb.add(b"k", b"v").unwrap();
        tb.flush().unwrap();
        let size = tb.file_size();
        assert!(size > 0);
        tb.flush().unwrap();
        assert_eq!(tb.file_size(), size);
        assert_eq!(tb.num_data_blocks(), 1);
    }

    #[test]
    fn accessors_track_progress() {
        let mut out = Vec::new();
        let mut tb = TableBuilder::new(plain_options(4096), &mut out).unwrap();
        assert_eq!(tb.num_data_blocks(), 0);

        tb.add(b"a", b"1").unwrap();
        tb.add(b"b", b"2").unwrap();
        assert_eq!(tb.num_entries(), 2);
        // still buffered
        assert_eq!(tb.file_size(), 0);
        assert_eq!(tb.num_data_blocks(), 1);

        tb.flush().unwrap();
        tb.add(b"c", b"3").unwrap();
        assert_eq!(tb.num_data_blocks(), 2);

        let summary = tb.finish().unwrap();
        assert_eq!(summary.num_entries, 3);
        assert_eq!(summary.num_data_blocks, 2);
        assert_eq!(summary.file_size, out.len() as u64);
    }

    #[test]
    fn filter_block_registered_in_meta_block() {
        let policy = Arc::new(BloomFilterPolicy::new(10));
        let opts = plain_options(4096).with_filter_policy(policy);
        let mut out = Vec::new();
        let mut tb = TableBuilder::new(opts, &mut out).unwrap();
        tb.add(b"x", b"y").unwrap();
        let summary = tb.finish().unwrap();

        let filter = summary.filter_handle.unwrap();
        // raw block directly after the single data block
        assert_eq!(out[(filter.offset + filter.size) as usize], CompressionType::None as u8);

        let meta = Block::from_bytes(block_from_slice(&out, summary.metaindex_handle).unwrap()).unwrap();
        let entries: Vec<_> = meta.iter().map(|e| e.unwrap()).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, b"filter.sstkv.BuiltinBloomFilter".to_vec());
        assert_eq!(BlockHandle::decode_from_bytes(&entries[0].1).unwrap(), filter);
    }

    #[test]
    fn rejects_invalid_options() {
        let mut out = Vec::new();
        let err = TableBuilder::new(plain_options(1), &mut out).err().unwrap();
        assert!(matches!(err, DBError::InvalidArgument(_)));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn entry_length_limit() {
        let max = u32::MAX as usize;
        assert!(check_entry_len(max, max).is_ok());
        assert!(matches!(check_entry_len(max + 1, 0), Err(DBError::InvalidArgument(_))));
        assert!(matches!(check_entry_len(3, max + 1), Err(DBError::InvalidArgument(_))));
    }

    #[test]
    fn write_error_surfaces_and_poisons() {
        let sink = FailingWriter { written: Vec::new(), budget: 10 };
        let mut tb = TableBuilder::new(plain_options(64), sink).unwrap();
        let err = tb.add(b"key", &[7u8; 100]).unwrap_err();
        assert!(matches!(err, DBError::Io(_)));
        assert!(tb.poisoned);
    }

    #[test]
    #[should_panic(expected = "operation on failed table builder")]
    fn use_after_error_panics() {
        let sink = FailingWriter { written: Vec::new(), budget: 0 };
        let mut tb = TableBuilder::new(plain_options(64), sink).unwrap();
        let _ = tb.add(b"key", &[7u8; 100]);
        let _ = tb.add(b"key2", b"v");
    }

    #[test]
    fn finish_error_is_reported() {
        let sink = FailingWriter { written: Vec::new(), budget: 20 };
        let mut tb = TableBuilder::new(plain_options(4096), sink).unwrap();
        tb.add(b"k", b"v").unwrap();
        assert!(matches!(tb.finish(), Err(DBError::Io(_))));
    }
}
