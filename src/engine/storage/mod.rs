//! Storage abstraction for numbered database files.
//!
//! The table builder only needs a `Write` sink; this module supplies one
//! (`StorageWriter`) together with the file bookkeeping around it: numbered
//! files by type, renames, the `CURRENT` manifest pointer and the storage
//! lock.

mod current;
mod file_storage;

use std::fmt;
use std::io::{self, Read, Seek, Write};

use crate::DBError;

pub use current::{read_current, write_current};
pub use file_storage::{FileStorage, FsFile, FsReader, FsWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Manifest,
    Journal,
    Table,
}

impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Manifest, FileType::Journal, FileType::Table];
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileType::Manifest => "manifest",
            FileType::Journal => "journal",
            FileType::Table => "table",
        };
        f.write_str(s)
    }
}

/// Appendable sink for a new file.
pub trait StorageWriter: Write {
    /// Flush buffered data and make it durable.
    fn sync(&mut self) -> io::Result<()>;
}

pub trait StorageReader: Read + Seek {
    /// Positioned read; does not move the cursor.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

pub trait StorageFile {
    type Reader: StorageReader;
    type Writer: StorageWriter;

    /// Fails with `NotFound` if the file does not exist.
    fn open(&self) -> Result<Self::Reader, DBError>;

    /// Create for writing, truncating any existing file.
    fn create(&self) -> Result<Self::Writer, DBError>;

    fn rename(&mut self, num: u64, file_type: FileType) -> Result<(), DBError>;

    fn exists(&self) -> bool;

    fn file_type(&self) -> FileType;

    fn num(&self) -> u64;

    fn size(&self) -> Result<u64, DBError>;

    fn remove(&self) -> Result<(), DBError>;
}

/// Releases the storage lock when dropped.
pub trait StorageLock {
    fn release(self) -> Result<(), DBError>;
}

pub trait Storage {
    type File: StorageFile;
    type Lock: StorageLock;

    /// Fails with `DBError::Locked` while another holder has the lock.
    fn lock(&self) -> Result<Self::Lock, DBError>;

    fn get_file(&self, num: u64, file_type: FileType) -> Self::File;

    /// Existing files of any of `types`, sorted by type then number.
    fn get_files(&self, types: &[FileType]) -> Result<Vec<Self::File>, DBError>;

    /// Fails with `DBError::NotFound` when no manifest has been set.
    fn get_manifest(&self) -> Result<Self::File, DBError>;

    fn set_manifest(&self, file: &Self::File) -> Result<(), DBError>;
}
