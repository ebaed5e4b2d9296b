// Growable file-backed log region
// Uses open + mmap(MAP_SHARED); grows by doubling and remapping

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

#[cfg(unix)]
use std::os::fd::AsRawFd;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Byte appended after every record when it fits.
pub const RECORD_SEPARATOR: u8 = b'\n';

/// Size a fresh (empty) log file is preallocated to.
pub const DEFAULT_INITIAL_SIZE: usize = 4096;

/// One live `mmap` of a file. Unmapped on drop.
///
/// The pointer and the length always travel together, so a region can only
/// be replaced as a whole.
struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

// The mapping is plain shared file memory; ownership moves with the backend.
unsafe impl Send for Mapping {}

impl Mapping {
    #[cfg(unix)]
    fn new(file: &File, len: usize) -> io::Result<Self> {
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        let ptr = NonNull::new(ptr as *mut u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))?;
        Ok(Self { ptr, len })
    }

    #[cfg(not(unix))]
    fn new(_file: &File, _len: usize) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "memory-mapped log files are only supported on unix",
        ))
    }

    #[cfg(unix)]
    fn sync(&self, len: usize) -> io::Result<()> {
        if len == 0 {
            return Ok(());
        }
        let rc = unsafe {
            libc::msync(
                self.ptr.as_ptr() as *mut libc::c_void,
                len.min(self.len),
                libc::MS_SYNC,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync(&self, _len: usize) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        #[cfg(unix)]
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.len);
        }
    }
}

/// The persistence backend: one file, one mapping, one write cursor.
///
/// Invariants:
/// - `0 <= cursor <= capacity`
/// - `[0, cursor)` is committed log content, `[cursor, capacity)` is slack
/// - the mapping always covers exactly `capacity` bytes
///
/// Only one thread touches a `MappedLog` at a time (it is `Send`, not `Sync`).
pub struct MappedLog {
    file: File,
    path: PathBuf,
    map: Mapping,
    cursor: usize,
}

impl MappedLog {
    /// Open or create the log at `path` and map it.
    ///
    /// A new (empty) file is extended to `initial_size` bytes. An existing file
    /// is mapped at its current size and the cursor is placed at its end, so
    /// subsequent appends continue after the existing content.
    ///
    /// # Arguments
    /// * `path` - Log file location
    /// * `initial_size` - Preallocation for a fresh file, in bytes
    pub fn open<P: AsRef<Path>>(path: P, initial_size: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if initial_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "initial log size must be non-zero",
            ));
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        options.mode(0o644);

        let file = options.open(&path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to open log file at {}: {}", path.display(), e),
            )
        })?;

        let existing = file.metadata()?.len() as usize;
        let capacity = if existing == 0 {
            file.set_len(initial_size as u64)?;
            initial_size
        } else {
            existing
        };

        let map = Mapping::new(&file, capacity).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!(
                    "Failed to map log file:\n\
                    ├─ Path:     {}\n\
                    ├─ Capacity: {capacity}\n\
                    ╰─ Error: {e}",
                    path.display()
                ),
            )
        })?;

        Ok(Self {
            file,
            path,
            map,
            cursor: existing,
        })
    }

    /// Make sure `needed` more bytes fit after the cursor, growing if not.
    ///
    /// Growth doubles the capacity until the request fits. The new mapping is
    /// established before the old one is released; on failure the old mapping
    /// stays in place and the file length is restored. If the restore itself
    /// fails, the returned error reports both failures and the file is left
    /// longer than the mapping.
    ///
    /// # Returns
    /// * `Ok(None)` if no growth was needed
    /// * `Ok(Some((old, new)))` with the capacities before and after growth
    pub fn ensure_capacity(&mut self, needed: usize) -> io::Result<Option<(usize, usize)>> {
        let required = self.cursor.checked_add(needed).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "log size overflows usize")
        })?;
        let old = self.map.len;
        if required <= old {
            return Ok(None);
        }

        let mut new_size = old;
        while new_size < required {
            new_size = new_size.checked_mul(2).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "log size overflows usize")
            })?;
        }

        self.file.set_len(new_size as u64)?;
        match Mapping::new(&self.file, new_size) {
            Ok(map) => {
                // Old region is unmapped here, after the new one is live.
                self.map = map;
                Ok(Some((old, new_size)))
            }
            Err(e) => match self.file.set_len(old as u64) {
                Ok(()) => Err(e),
                Err(restore) => Err(io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to remap log file and restore its length:\n\
                        ├─ Path:    {}\n\
                        ├─ Mapped:  {old}\n\
                        ├─ Remap:   {e}\n\
                        ╰─ Restore: {restore}",
                        self.path.display()
                    ),
                )),
            },
        }
    }

    /// Copy `record` at the cursor and follow it with a separator if room remains.
    ///
    /// The caller must have reserved space with [`ensure_capacity`](Self::ensure_capacity).
    pub fn append(&mut self, record: &[u8]) -> io::Result<()> {
        let end = self.cursor + record.len();
        if end > self.map.len {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "record of {} bytes does not fit at {} (capacity {})",
                    record.len(),
                    self.cursor,
                    self.map.len
                ),
            ));
        }

        unsafe {
            let dst = self.map.ptr.as_ptr().add(self.cursor);
            std::ptr::copy_nonoverlapping(record.as_ptr(), dst, record.len());
        }
        self.cursor = end;

        if self.cursor < self.map.len {
            unsafe {
                *self.map.ptr.as_ptr().add(self.cursor) = RECORD_SEPARATOR;
            }
            self.cursor += 1;
        }
        Ok(())
    }

    /// Synchronously write the committed range back to the file.
    pub fn flush(&self) -> io::Result<()> {
        self.map.sync(self.cursor)
    }

    /// Unmap, truncate the file to exactly the committed size, and close it.
    ///
    /// # Returns
    /// The final file size in bytes.
    pub fn finalize(self) -> io::Result<usize> {
        let Self {
            file,
            path,
            map,
            cursor,
        } = self;

        drop(map);
        file.set_len(cursor as u64).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to trim log file {} to {cursor}: {e}", path.display()),
            )
        })?;
        Ok(cursor)
    }

    /// Committed bytes.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Mapped (and file) size in bytes.
    pub fn capacity(&self) -> usize {
        self.map.len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The committed log content.
    pub fn committed(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.map.ptr.as_ptr(), self.cursor) }
    }
}

impl Debug for MappedLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_mapped_file(self, f)
    }
}
