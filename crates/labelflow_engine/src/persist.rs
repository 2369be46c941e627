use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Upper bound on `name (n).ext` candidates tried before giving up.
const MAX_SIBLINGS: u32 = 999;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory unusable: {0}")]
    OutputDir(String),
    #[error("no free name for {0} in the output directory")]
    NameExhausted(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// What to do when the target name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Overwrite it. Used for settings files.
    Replace,
    /// Save alongside as `name (1).ext`, `name (2).ext`, ...
    KeepBoth,
}

/// Creates `dir` (and parents) unless it already exists as a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dir)
            .map_err(|e| PersistError::OutputDir(format!("{}: {e}", dir.display()))),
        Err(err) => Err(PersistError::OutputDir(format!("{}: {err}", dir.display()))),
    }
}

/// Writes whole files into one directory via a synced temp file and a rename,
/// so a crash never leaves a truncated archive or preference file behind.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the path actually written, which differs from `filename`
    /// only under [`Collision::KeepBoth`].
    pub fn write(
        &self,
        filename: &str,
        content: impl AsRef<[u8]>,
        collision: Collision,
    ) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_ref())?;
        tmp.as_file_mut().sync_all()?;

        match collision {
            Collision::Replace => {
                let target = self.dir.join(filename);
                // Windows refuses to rename over an existing file.
                if target.exists() {
                    fs::remove_file(&target)?;
                }
                tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
                Ok(target)
            }
            Collision::KeepBoth => {
                for n in 0..=MAX_SIBLINGS {
                    let target = self.dir.join(sibling_name(filename, n));
                    match tmp.persist_noclobber(&target) {
                        Ok(_) => return Ok(target),
                        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                            tmp = err.file;
                        }
                        Err(err) => return Err(PersistError::Io(err.error)),
                    }
                }
                Err(PersistError::NameExhausted(filename.to_string()))
            }
        }
    }
}

/// `report.zip` -> `report (n).zip`; `n == 0` keeps the name as is.
fn sibling_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &filename[..dot], &filename[dot..]),
        _ => format!("{filename} ({n})"),
    }
}
