use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::DBError;
use crate::engine::storage::{read_current, write_current, FileType, Storage, StorageFile, StorageLock,
                             StorageReader, StorageWriter};
use crate::util::constants::LOCK_FILE;

/// Directory-backed storage.
///
/// File names: tables `000042.sst`, journals `000042.log`, manifests
/// `MANIFEST-000042`. `CURRENT` names the live manifest and `LOCK` is held
/// while the storage is locked.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, DBError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

pub(crate) fn file_name(num: u64, file_type: FileType) -> String {
    match file_type {
        FileType::Manifest => format!("MANIFEST-{num:06}"),
        FileType::Journal => format!("{num:06}.log"),
        FileType::Table => format!("{num:06}.sst"),
    }
}

pub(crate) fn parse_file_name(name: &str) -> Option<(u64, FileType)> {
    if let Some(num) = name.strip_prefix("MANIFEST-") {
        return num.parse().ok().map(|n| (n, FileType::Manifest));
    }
    let (stem, ext) = name.split_once('.')?;
    let file_type = match ext {
        "log" => FileType::Journal,
        "sst" => FileType::Table,
        _ => return None,
    };
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok().map(|n| (n, file_type))
}

impl Storage for FileStorage {
    type File = FsFile;
    type Lock = FsLock;

    fn lock(&self) -> Result<FsLock, DBError> {
        let path = self.dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                log::debug!("acquired storage lock {}", path.display());
                Ok(FsLock { path, released: false })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(DBError::Locked),
            Err(e) => Err(DBError::Io(e)),
        }
    }

    fn get_file(&self, num: u64, file_type: FileType) -> FsFile {
        FsFile { dir: self.dir.clone(), num, file_type }
    }

    fn get_files(&self, types: &[FileType]) -> Result<Vec<FsFile>, DBError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some((num, file_type)) = name.to_str().and_then(parse_file_name) else {
                continue;
            };
            if types.contains(&file_type) {
                files.push(self.get_file(num, file_type));
            }
        }
        files.sort_by_key(|f| (FileType::ALL.iter().position(|t| *t == f.file_type), f.num));
        Ok(files)
    }

    fn get_manifest(&self) -> Result<FsFile, DBError> {
        let name = read_current(&self.dir)?;
        match parse_file_name(&name) {
            Some((num, FileType::Manifest)) => Ok(self.get_file(num, FileType::Manifest)),
            _ => Err(DBError::Corruption(format!("CURRENT names a non-manifest file: {name}"))),
        }
    }

    fn set_manifest(&self, file: &FsFile) -> Result<(), DBError> {
        if file.file_type != FileType::Manifest {
            return Err(DBError::InvalidArgument(format!(
                "set_manifest needs a manifest file, got {}",
                file.file_type
            )));
        }
        write_current(&self.dir, &file_name(file.num, file.file_type))
    }
}

pub struct FsLock {
    path: PathBuf,
    released: bool,
}

impl StorageLock for FsLock {
    fn release(mut self) -> Result<(), DBError> {
        self.released = true;
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

impl Drop for FsLock {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("failed to release storage lock {}: {}", self.path.display(), e);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsFile {
    dir: PathBuf,
    num: u64,
    file_type: FileType,
}

impl FsFile {
    pub fn path(&self) -> PathBuf {
        self.dir.join(file_name(self.num, self.file_type))
    }
}

impl StorageFile for FsFile {
    type Reader = FsReader;
    type Writer = FsWriter;

    fn open(&self) -> Result<FsReader, DBError> {
        match File::open(self.path()) {
            Ok(file) => Ok(FsReader { file }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DBError::NotFound(format!("{} {}", self.file_type, self.num)))
            }
            Err(e) => Err(DBError::Io(e)),
        }
    }

    fn create(&self) -> Result<FsWriter, DBError> {
        let file = File::create(self.path())?;
        Ok(FsWriter { inner: BufWriter::new(file) })
    }

    fn rename(&mut self, num: u64, file_type: FileType) -> Result<(), DBError> {
        let to = self.dir.join(file_name(num, file_type));
        fs::rename(self.path(), &to)?;
        self.num = num;
        self.file_type = file_type;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path().exists()
    }

    fn file_type(&self) -> FileType {
        self.file_type
    }

    fn num(&self) -> u64 {
        self.num
    }

    fn size(&self) -> Result<u64, DBError> {
        Ok(fs::metadata(self.path())?.len())
    }

    fn remove(&self) -> Result<(), DBError> {
        fs::remove_file(self.path())?;
        Ok(())
    }
}

pub struct FsReader {
    file: File,
}

impl Read for FsReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for FsReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl StorageReader for FsReader {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, offset)
    }
}

pub struct FsWriter {
    inner: BufWriter<File>,
}

impl Write for FsWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl StorageWriter for FsWriter {
    fn sync(&mut self) -> io::Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().sync_data()
    }
}
