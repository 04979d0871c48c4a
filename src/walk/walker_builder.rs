use crate::{WalkConfig, walk::walker::Walker};
use core::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/**
 A builder for creating a [`Walker`].

 Defaults: recursive, unknown entry types ignored, one thread.
*/
#[derive(Debug, Clone)]
pub struct WalkerBuilder {
    pub(crate) root: PathBuf,
    pub(crate) config: WalkConfig,
}

impl WalkerBuilder {
    /**
      Creates a new `WalkerBuilder`.

      # Arguments
      `root` - The directory to list, an empty path means the current directory
    */
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: WalkConfig::default(),
        }
    }

    /// Set whether to descend below the root's children, defaults to true
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Set whether to `fstatat` entries of unknown type, defaults to false
    #[must_use]
    pub const fn resolve_unknown(mut self, resolve: bool) -> Self {
        self.config.resolve_unknown = resolve;
        self
    }

    /// Set how many worker threads a recursive walk uses, 0 is treated as 1
    #[must_use]
    pub const fn threads(mut self, threads: usize) -> Self {
        self.config.threads = match NonZeroUsize::new(threads) {
            Some(n) => n,
            None => NonZeroUsize::MIN,
        };
        self
    }

    /// Builds the [`Walker`]
    #[must_use]
    pub fn build(self) -> Walker {
        let root = if self.root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            self.root
        };

        Walker {
            root,
            config: self.config,
        }
    }
}
