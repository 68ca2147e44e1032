//! Positional file access and stat helpers.
//!
//! Workers read the shared input handle at absolute offsets; there is no
//! shared seek cursor to race on. Modification times travel through the
//! container as unix milliseconds and are restored on decompress.

use std::fs::{File, Metadata};
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use filetime::FileTime;

/// Reads exactly `buf.len()` bytes at `offset` without moving any cursor.
#[cfg(unix)]
pub fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

/// Reads exactly `buf.len()` bytes at `offset` without moving any cursor.
#[cfg(windows)]
pub fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut filled = 0usize;
    while filled < buf.len() {
        match file.seek_read(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "positional read past end of file",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Current size of an open file.
pub fn file_size(file: &File) -> io::Result<u64> {
    Ok(file.metadata()?.len())
}

/// Modification time as unix milliseconds; 0 when the filesystem cannot say.
pub fn mtime_unix_ms(meta: &Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Restores a stored modification time.
pub fn set_mtime_unix_ms(path: &Path, ms: u64) -> io::Result<()> {
    let ft = FileTime::from_unix_time((ms / 1000) as i64, ((ms % 1000) * 1_000_000) as u32);
    filetime::set_file_mtime(path, ft)
}
