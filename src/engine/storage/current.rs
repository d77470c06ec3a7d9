use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::DBError;
use crate::util::constants::CURRENT_FILE;

const CURRENT_TMP_FILE: &str = "CURRENT.tmp";

/// Read CURRENT and return the manifest file name it points at.
pub fn read_current(db_dir: &Path) -> Result<String, DBError> {
    let path = db_dir.join(CURRENT_FILE);
    let mut file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DBError::NotFound("no CURRENT manifest".into()));
        }
        Err(e) => return Err(DBError::Io(e)),
    };

    let mut buf = String::new();
    file.read_to_string(&mut buf)?;

    let name = buf.trim_end_matches('\n').to_string();
    if name.is_empty() {
        return Err(DBError::Corruption("CURRENT is empty".into()));
    }
    Ok(name)
}

/// Atomically point CURRENT at `manifest_name` (write tmp, sync, rename).
pub fn write_current(db_dir: &Path, manifest_name: &str) -> Result<(), DBError> {
    let tmp_path = db_dir.join(CURRENT_TMP_FILE);
    let final_path = db_dir.join(CURRENT_FILE);

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(manifest_name.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, &final_path)?;
    Ok(())
}
