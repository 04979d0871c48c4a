use std::{fmt, io, path::PathBuf};

#[derive(Debug)]
/// An error type for directory listing operations.
///
/// A directory that does not exist is never reported through this type, the walker
/// treats it as an empty listing. Everything else aborts the whole traversal.
pub enum WalkError {
    /// The path contains an interior NUL byte and can't be handed to the OS
    InvalidPath(PathBuf),
    /// Opening the directory failed (permission denied, not a directory, out of descriptors...)
    Open { path: PathBuf, source: io::Error },
    /// The raw read call itself failed, `op` names the syscall
    Read {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// The decoder made no progress on a non-empty window of the buffer
    MalformedStream {
        path: PathBuf,
        offset: usize,
        remaining: usize,
    },
    /// Resolving a `DT_UNKNOWN` entry failed
    Stat { path: PathBuf, source: io::Error },
    /// A worker thread of the parallel walker panicked
    ThreadPanicked,
    /// Writing results out failed
    Write(io::Error),
}

impl WalkError {
    /// The underlying OS error code, if there is one
    #[must_use]
    #[inline]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Open { source, .. }
            | Self::Read { source, .. }
            | Self::Stat { source, .. }
            | Self::Write(source) => source.raw_os_error(),
            _ => None,
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPath(path) => {
                write!(f, "Invalid path (contains NUL byte): {}", path.display())
            }
            Self::Open { path, source } => {
                write!(f, "Failed to open directory {}: {source}", path.display())
            }
            Self::Read { op, path, source } => {
                write!(f, "{op} failed on {}: {source}", path.display())
            }
            Self::MalformedStream {
                path,
                offset,
                remaining,
            } => write!(
                f,
                "Malformed directory stream for {} at offset {offset} ({remaining} bytes left undecoded)",
                path.display()
            ),
            Self::Stat { path, source } => {
                write!(f, "Failed to stat {}: {source}", path.display())
            }
            Self::ThreadPanicked => write!(f, "A walker thread panicked"),
            Self::Write(e) => write!(f, "Write error: {e}"),
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Read { source, .. }
            | Self::Stat { source, .. }
            | Self::Write(source) => Some(source),
            _ => None,
        }
    }
}
