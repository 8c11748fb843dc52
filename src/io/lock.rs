use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file inside a data directory
pub const LOCK_FILE: &str = ".lock";

/// How long `DirBackend::open` waits for another `bless` to finish
pub const DEFAULT_WAIT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive hold on a data directory.
///
/// The hold is an flock on `<dir>/.lock`, tied to the open file handle, so it
/// ends when the guard is dropped or the process exits. The file is never
/// removed, so waiters and later openers always contend for the same inode.
/// While held, the file contains the holder's pid.
#[derive(Debug)]
pub struct DirLock {
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("data directory {dir} is in use by another bless process{}", pid_note(.holder))]
    Busy { dir: PathBuf, holder: Option<u32> },
}

fn pid_note(holder: &Option<u32>) -> String {
    holder.map(|pid| format!(" (pid {pid})")).unwrap_or_default()
}

impl DirLock {
    /// Take the lock on `dir`, polling for up to `wait`.
    pub fn acquire(dir: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open { path, source })?;

        let start = Instant::now();
        while !try_flock(&file) {
            if start.elapsed() >= wait {
                return Err(LockError::Busy {
                    dir: dir.to_path_buf(),
                    holder: read_holder(&mut file),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        // The pid is only a hint for the busy message
        let _ = record_holder(&mut file);
        tracing::debug!(dir = %dir.display(), "locked data directory");
        Ok(DirLock { _file: file })
    }
}

fn record_holder(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())?;
    file.flush()
}

fn read_holder(file: &mut File) -> Option<u32> {
    let mut text = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}

#[cfg(unix)]
fn try_flock(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> bool {
    true
}
