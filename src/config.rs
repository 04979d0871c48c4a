use crate::fs::DirentDecoder;
use core::num::NonZeroUsize;

crate::const_from_env!(
    /// Worker count used when none is given, set by `build.rs` from the build machine
    THREAD_COUNT: usize = "THREAD_COUNT", 1
);

/// Run-time options for a directory walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkConfig {
    /// Descend into every directory found, not just the root's children
    pub recursive: bool,
    /// `fstatat` entries whose type the filesystem reported as unknown
    pub resolve_unknown: bool,
    /// Worker threads for recursive walks, 1 walks sequentially
    pub threads: NonZeroUsize,
}

impl Default for WalkConfig {
    #[inline]
    fn default() -> Self {
        Self {
            recursive: true,
            resolve_unknown: false,
            threads: NonZeroUsize::MIN,
        }
    }
}

impl WalkConfig {
    /// The decoder matching these options
    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[must_use]
    #[inline]
    pub const fn decoder(&self) -> DirentDecoder {
        DirentDecoder::native().with_unknown(self.resolve_unknown)
    }

    /// Whether the walk should fan out over worker threads
    #[must_use]
    #[inline]
    pub const fn is_parallel(&self) -> bool {
        self.recursive && self.threads.get() > 1
    }
}
