use std::{
    collections::{BTreeSet, HashSet},
    hash::BuildHasher,
    path::PathBuf,
};

/**
 A collection the walker can record discovered directories into.

 Implementations must have set semantics. The walker never produces the same path twice
 within one walk, so inserting is all it needs.
*/
pub trait DirectorySet {
    /// Records a discovered directory, returns `false` if it was already present
    fn insert_dir(&mut self, path: PathBuf) -> bool;
}

impl<S: BuildHasher> DirectorySet for HashSet<PathBuf, S> {
    #[inline]
    fn insert_dir(&mut self, path: PathBuf) -> bool {
        self.insert(path)
    }
}

/// Ordered output, handy when results are printed sorted
impl DirectorySet for BTreeSet<PathBuf> {
    #[inline]
    fn insert_dir(&mut self, path: PathBuf) -> bool {
        self.insert(path)
    }
}
