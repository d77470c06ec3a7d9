use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};

use sstkv::engine::storage::{FileStorage, FileType, Storage, StorageFile, StorageLock, StorageWriter};
use sstkv::util::load_table_config;
use sstkv::{TableBuilder, TableReader};

const USAGE: &str = "usage:
  sstkv build <db-dir> <file-num> <input.tsv>   build a table from key<TAB>value lines
  sstkv dump  <db-dir> <file-num>               print footer, index and entry count";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["build", dir, num, input] => build(PathBuf::from(dir), num.parse()?, PathBuf::from(input)),
        ["dump", dir, num] => dump(PathBuf::from(dir), num.parse()?),
        _ => bail!("{USAGE}"),
    }
}

fn build(dir: PathBuf, num: u64, input: PathBuf) -> anyhow::Result<()> {
    let storage = FileStorage::open(&dir)?;
    let lock = storage.lock().context("locking storage")?;

    let options = load_table_config(&dir)?.to_table_options_with_default_filter()?;

    let text = fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
    let mut pairs = BTreeMap::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let Some((k, v)) = line.split_once('\t') else {
            bail!("{}:{}: missing tab separator", input.display(), lineno + 1);
        };
        pairs.insert(k.as_bytes().to_vec(), v.as_bytes().to_vec());
    }

    let file = storage.get_file(num, FileType::Table);
    let mut w = file.create()?;
    let mut builder = TableBuilder::new(options, &mut w)?;
    for (k, v) in &pairs {
        builder.add(k, v)?;
    }
    let summary = builder.finish()?;
    w.sync()?;

    println!(
        "wrote table {}: {} entries, {} data blocks, {} bytes",
        num, summary.num_entries, summary.num_data_blocks, summary.file_size
    );
    lock.release()?;
    Ok(())
}

fn dump(dir: PathBuf, num: u64) -> anyhow::Result<()> {
    let storage = FileStorage::open(&dir)?;
    let options = load_table_config(&dir)?.to_table_options_with_default_filter()?;
    let file = storage.get_file(num, FileType::Table);

    let mut reader = TableReader::open(file.open()?, options.filter_policy.clone())?
        .with_comparator(options.comparator.clone());

    let footer = *reader.footer();
    println!("file size:  {}", reader.file_len());
    println!("metaindex:  {:?}", footer.metaindex_handle);
    println!("index:      {:?}", footer.index_handle);
    println!("filter:     {}", if reader.has_filter() { "yes" } else { "no" });
    for (key, handle) in reader.index() {
        println!("  {:<32} offset={} size={}", String::from_utf8_lossy(key), handle.offset, handle.size);
    }
    let entries = reader.entries()?;
    println!("entries:    {}", entries.len());
    Ok(())
}
