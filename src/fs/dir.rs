use crate::WalkError;
use crate::fs::{DirBuffer, DirentDecoder, FileDes, Listing, Result};
use std::{
    ffi::{CString, OsString},
    io,
    os::unix::ffi::OsStrExt as _,
    path::Path,
};
use tracing::{debug, trace};

/// Name of the raw read operation, attached to read failures
pub const READ_OP: &str = "getdents64";

/**
 An open directory being drained through `getdents64`.

 Owns the descriptor and the read buffer for exactly one listing. Dropping the stream
 closes the descriptor, whichever way the listing ends.
*/
#[derive(Debug)]
pub struct DirStream<'path> {
    /// Path the descriptor was opened from, kept for error reporting
    path: &'path Path,
    fd: FileDes,
    buffer: DirBuffer,
}

impl<'path> DirStream<'path> {
    /**
     Opens `path` for listing.

     Returns `Ok(None)` when the directory doesn't exist: it may have been removed between
     being listed by its parent and being opened here, which is not an error.

     # Errors
     - [`WalkError::InvalidPath`] if the path holds a NUL byte
     - [`WalkError::Open`] for any other open failure
    */
    #[inline]
    pub fn open(path: &'path Path) -> Result<Option<Self>> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| WalkError::InvalidPath(path.to_path_buf()))?;

        match FileDes::open_dir(&c_path) {
            Ok(fd) => Ok(Some(Self {
                path,
                fd,
                buffer: DirBuffer::new(),
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "directory vanished, skipping");
                Ok(None)
            }
            Err(source) => Err(WalkError::Open {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    #[must_use]
    #[inline]
    pub const fn path(&self) -> &'path Path {
        self.path
    }

    #[must_use]
    #[inline]
    pub const fn dirfd(&self) -> &FileDes {
        &self.fd
    }

    /// Refills the buffer, `false` at end of directory
    #[inline]
    fn fill_buffer(&mut self) -> Result<bool> {
        let read = self.buffer.refill(&self.fd).map_err(|source| WalkError::Read {
            op: READ_OP,
            path: self.path.to_path_buf(),
            source,
        })?;
        trace!(path = %self.path.display(), bytes = read, "{READ_OP}");
        Ok(read != 0)
    }

    /**
     Reads and decodes the whole directory into `listing`.

     # Errors
     - [`WalkError::Read`] when `getdents64` fails
     - [`WalkError::MalformedStream`] when the decoder can't make progress on what the
       kernel returned, instead of spinning on it
    */
    #[inline]
    pub fn read_into(&mut self, decoder: &DirentDecoder, listing: &mut Listing) -> Result<()> {
        loop {
            if self.buffer.is_drained() && !self.fill_buffer()? {
                return Ok(());
            }

            self.buffer.decode_window(decoder, listing, self.path)?;
        }
    }

    /**
     Resolves entries the filesystem reported as `DT_UNKNOWN` with `fstatat` against the
     still open directory, moving the ones that are directories into `listing.dirs`.

     Symlinks are not followed. Entries that disappeared in the meantime are dropped.

     # Errors
     [`WalkError::Stat`] for any other `fstatat` failure.
    */
    #[inline]
    pub fn resolve_unknown(&self, listing: &mut Listing) -> Result<()> {
        for name in listing.unknown.drain(..) {
            let c_name = CString::new(name.as_bytes())
                .map_err(|_| WalkError::InvalidPath(self.path.join(&name)))?;

            match fstatat_mode!(self.fd.0, c_name.as_ptr(), libc::AT_SYMLINK_NOFOLLOW) {
                Ok(mode) if mode & libc::S_IFMT == libc::S_IFDIR => listing.dirs.push(name),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(WalkError::Stat {
                        path: self.path.join(&name),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

/**
 Lists the names of the sub-directories directly inside `path`.

 A missing directory yields an empty list. The descriptor is closed before this returns.

 # Errors
 See [`DirStream::open`], [`DirStream::read_into`] and [`DirStream::resolve_unknown`].
*/
#[inline]
pub fn read_directory_names(path: &Path, decoder: &DirentDecoder) -> Result<Vec<OsString>> {
    let Some(mut stream) = DirStream::open(path)? else {
        return Ok(Vec::new());
    };

    let mut listing = Listing::with_capacity(16);
    stream.read_into(decoder, &mut listing)?;
    if !listing.unknown.is_empty() {
        stream.resolve_unknown(&mut listing)?;
    }

    trace!(path = %path.display(), dirs = listing.dirs.len(), "listed");
    Ok(listing.dirs)
}
