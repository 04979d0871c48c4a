/*!
 `lsdirs` lists the sub-directories below a path without `stat`ing a single entry.

 Directories are read with raw `getdents64` calls into a fixed size buffer and the
 records are decoded in place: the kernel already says which entries are directories,
 so nothing else is needed. Only `DT_DIR` entries are kept; `.`, `..` and deleted slots
 are skipped before any allocation happens.

 ```no_run
 use std::collections::HashSet;
 use std::path::PathBuf;

 let mut dirs: HashSet<PathBuf> = HashSet::new();
 lsdirs::list_directories("/sys/fs/cgroup", "", true, &mut dirs)?;
 # Ok::<(), lsdirs::WalkError>(())
 ```

 The record decoder is independent of the platform: it is driven by a
 [`fs::DirentLayout`] describing field offsets, widths and byte order, and can be fed
 any captured buffer.
*/
#![cfg(unix)]

#[macro_use]
mod macros;

mod config;
mod error;
pub mod fs;
mod util;
#[cfg(any(target_os = "linux", target_os = "android"))]
mod walk;


pub use config::{THREAD_COUNT, WalkConfig};
pub use error::WalkError;
pub use util::is_dot_or_dot_dot;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use walk::{DirectorySet, Walker, WalkerBuilder, list_directories};
