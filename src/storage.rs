//! The values byte stream: a thin random-access wrapper over
//! `std::fs::File` with `seek`/`read`/`write`/`truncate`/`flush`.
//!
//! A read that comes back short is an error rather than a silently
//! truncated buffer, and a write that doesn't place every byte is
//! `ShortWrite` rather than silently accepted. Closedness is tracked by
//! `Store` itself (it drops `Inner` on `close`); `handle()` is the only
//! place that needs to know whether the underlying file is still open.

use std::convert::TryFrom;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};

pub(crate) struct ValuesFile {
    file: Option<File>,
    sync_on_write: bool,
}

impl ValuesFile {
    /// Open (creating if absent) a file for random read/write access.
    pub fn open<P: AsRef<Path>>(path: P, sync_on_write: bool) -> Result<ValuesFile> {
        let file = err_at!(
            IoError,
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path.as_ref())
        )?;
        Ok(ValuesFile {
            file: Some(file),
            sync_on_write,
        })
    }

    fn handle(&mut self) -> Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| Error::HandleClosed("values file".to_string()))
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        err_at!(IoError, self.handle()?.seek(SeekFrom::Start(offset)))?;
        Ok(())
    }

    pub fn read(&mut self, n: u64) -> Result<Vec<u8>> {
        let want = usize::try_from(n).expect("read length overflowed usize");
        let mut buf = vec![0u8; want];
        let fd = self.handle()?;
        let got = err_at!(IoError, fd.read(&mut buf))?;
        if got != want {
            return err_at!(IoError, msg: "short read {}/{}", got, want);
        }
        Ok(buf)
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let fd = self.handle()?;
        let n = err_at!(IoError, fd.write(bytes))?;
        if n != bytes.len() {
            return Err(Error::ShortWrite(format!("wrote {}/{} bytes", n, bytes.len())));
        }
        Ok(n)
    }

    pub fn truncate(&mut self, length: u64) -> Result<()> {
        err_at!(IoError, self.handle()?.set_len(length))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        let sync_on_write = self.sync_on_write;
        let fd = self.handle()?;
        err_at!(IoError, fd.flush())?;
        if sync_on_write {
            err_at!(IoError, fd.sync_all())?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.file = None;
    }
}

/// Read an entire byte stream's contents up-front; used for the
/// metadata file, which is small enough to load wholesale on open.
pub(crate) fn read_whole_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    if !path.as_ref().exists() {
        return Ok(Vec::new());
    }
    Ok(err_at!(IoError, fs::read(path.as_ref()))?)
}

/// Overwrite a byte stream's contents wholesale; used for the metadata
/// file, writing then `sync_all`-ing (or plain `flush`-ing) in one call.
pub(crate) fn write_whole_file<P: AsRef<Path>>(path: P, bytes: &[u8], sync: bool) -> Result<()> {
    let mut fd = err_at!(
        IoError,
        OpenOptions::new().write(true).create(true).truncate(true).open(path.as_ref())
    )?;
    let n = err_at!(IoError, fd.write(bytes))?;
    if n != bytes.len() {
        return Err(Error::ShortWrite(format!("wrote {}/{} bytes", n, bytes.len())));
    }
    if sync {
        err_at!(IoError, fd.sync_all())?;
    } else {
        err_at!(IoError, fd.flush())?;
    }
    Ok(())
}
