//! File helpers shared by every stage
//!
//! Stage outputs are never written in place: they go to a sibling
//! `<name>.tmp` file that is renamed over the destination only once the
//! stage has succeeded. A failed stage leaves no output file behind.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// A destination path plus the temporary file that will replace it
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    temp: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Prepare a staged write for `target`, creating parent directories
    pub fn new<P: AsRef<Path>>(target: P) -> io::Result<Self> {
        let target = target.as_ref().to_path_buf();
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file_name = target
            .file_name()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("output path has no file name: {}", target.display()),
                )
            })?
            .to_string_lossy()
            .into_owned();
        let temp = target.with_file_name(format!("{}.tmp", file_name));

        Ok(Self {
            target,
            temp,
            committed: false,
        })
    }

    /// Path of the temporary file
    pub fn path(&self) -> &Path {
        &self.temp
    }

    /// Final destination
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Fill the temporary file through a buffered writer and sync it
    pub fn write<F, E>(&self, write: F) -> Result<(), E>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), E>,
        E: From<io::Error>,
    {
        let mut writer = BufWriter::new(File::create(&self.temp)?);
        write(&mut writer)?;

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    /// Atomically move the temporary file onto the destination
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

/// Commit several staged files as one output set
///
/// If any rename fails, targets already committed by this call are removed
/// so no partial set is left behind.
pub fn commit_all(files: Vec<StagedFile>) -> io::Result<()> {
    let mut committed: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        let target = file.target.clone();
        if let Err(e) = file.commit() {
            for done in &committed {
                fs::remove_file(done).ok();
            }
            return Err(e);
        }
        committed.push(target);
    }
    Ok(())
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed && self.temp.exists() {
            fs::remove_file(&self.temp).ok();
        }
    }
}

/// Write `path` through a staged temporary file
///
/// The closure receives a buffered writer; if it returns an error the
/// temporary file is removed and `path` is left untouched.
pub fn write_atomic<P, F, E>(path: P, write: F) -> Result<(), E>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> Result<(), E>,
    E: From<io::Error>,
{
    let staged = StagedFile::new(path)?;
    staged.write(write)?;
    staged.commit()?;
    Ok(())
}

/// SHA-256 of a file's contents as lowercase hex
pub fn file_sha256<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
