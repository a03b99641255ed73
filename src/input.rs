//! Read-only access to the measurements file.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{Result, SolveError};

/// An opened input file together with the size it had when opened.
///
/// Reads are positional, so any number of handles may read disjoint ranges
/// of the same file concurrently. The handle is closed on drop.
#[derive(Debug)]
pub struct InputFile {
    file: File,
    size: u64,
}

impl InputFile {
    /// Open `path` read-only and stat it once.
    pub fn open(path: &Path) -> Result<Self> {
        let access = |source| SolveError::InputAccess {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(access)?;
        let metadata = file.metadata().map_err(access)?;
        if !metadata.is_file() {
            return Err(access(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        Ok(Self {
            file,
            size: metadata.len(),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Fill `buf` from `offset`, stopping early only at end of file.
    ///
    /// Returns the number of bytes placed in `buf`.
    pub fn read_window(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match read_at(&self.file, &mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_missing_file() {
        let err = InputFile::open(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, SolveError::InputAccess { .. }));
    }

    #[test]
    fn test_open_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputFile::open(dir.path()).unwrap_err();
        assert!(matches!(err, SolveError::InputAccess { .. }));
    }

    #[test]
    fn test_read_window_clips_at_eof() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abcdefgh").unwrap();
        file.flush().unwrap();

        let input = InputFile::open(file.path()).unwrap();
        assert_eq!(input.size(), 8);

        let mut buf = [0u8; 5];
        assert_eq!(input.read_window(&mut buf, 0).unwrap(), 5);
        assert_eq!(&buf, b"abcde");
        assert_eq!(input.read_window(&mut buf, 6).unwrap(), 2);
        assert_eq!(&buf[..2], b"gh");
        assert_eq!(input.read_window(&mut buf, 8).unwrap(), 0);
    }
}
