use crate::{
    WalkConfig,
    fs::{DirentDecoder, Result, read_directory_names},
    walk::{DirectorySet, parallel, walker_builder::WalkerBuilder},
};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::debug;

/**
 Lists the sub-directories of `path` into `output`.

 Every directory found is inserted as `relative_prefix` joined with its name, before the
 walker descends into it. With `recursive` the whole tree below `path` is listed depth
 first, otherwise only the immediate children.

 A `path` that does not exist adds nothing and is not an error. Entries are never
 `stat`ed: only entries the kernel reports as `DT_DIR` count, so symlinks to directories
 are not followed.

 # Errors
 The first open, read or decode failure aborts the walk and is returned. Directories
 already inserted stay in `output`.

 # Examples
 ```no_run
 use std::collections::HashSet;
 use std::path::PathBuf;

 let mut found: HashSet<PathBuf> = HashSet::new();
 lsdirs::list_directories("/sys/fs/cgroup", "", true, &mut found)?;
 for dir in &found {
     println!("{}", dir.display());
 }
 # Ok::<(), lsdirs::WalkError>(())
 ```
*/
#[inline]
pub fn list_directories<P, Q, O>(
    path: P,
    relative_prefix: Q,
    recursive: bool,
    output: &mut O,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    O: DirectorySet + ?Sized,
{
    list_with(
        &DirentDecoder::native(),
        path.as_ref(),
        relative_prefix.as_ref(),
        recursive,
        output,
    )
}

/// Depth-first listing. Each level's descriptor and buffer are released before recursing.
pub(crate) fn list_with<O: DirectorySet + ?Sized>(
    decoder: &DirentDecoder,
    path: &Path,
    relative_prefix: &Path,
    recursive: bool,
    output: &mut O,
) -> Result<()> {
    let names = read_directory_names(path, decoder)?;

    for name in names {
        let child_relative = relative_prefix.join(&name);

        if recursive {
            output.insert_dir(child_relative.clone());
            list_with(decoder, &path.join(&name), &child_relative, true, output)?;
        } else {
            output.insert_dir(child_relative);
        }
    }

    Ok(())
}

/**
 A configured directory walk rooted at one path.

 ```no_run
 use lsdirs::Walker;

 let dirs = Walker::init("/usr/share").threads(4).build().walk()?;
 println!("{} directories", dirs.len());
 # Ok::<(), lsdirs::WalkError>(())
 ```
*/
#[derive(Debug, Clone)]
pub struct Walker {
    pub(crate) root: PathBuf,
    pub(crate) config: WalkConfig,
}

impl Walker {
    /// Starts configuring a walk of `root`
    #[must_use]
    #[inline]
    pub fn init<P: AsRef<Path>>(root: P) -> WalkerBuilder {
        WalkerBuilder::new(root)
    }

    /// Returns a reference to the underlying root
    #[must_use]
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    #[inline]
    pub const fn config(&self) -> &WalkConfig {
        &self.config
    }

    /**
     Walks the tree, inserting relative paths of every directory found into `output`.

     # Errors
     See [`list_directories`]. With several threads the error returned is the first one
     any worker hit.
    */
    #[inline]
    pub fn walk_into<O: DirectorySet + ?Sized>(&self, output: &mut O) -> Result<()> {
        debug!(
            root = %self.root.display(),
            recursive = self.config.recursive,
            threads = self.config.threads.get(),
            "starting walk"
        );
        let decoder = self.config.decoder();

        if self.config.is_parallel() {
            for dir in parallel::walk(&self.root, &decoder, self.config.threads)? {
                output.insert_dir(dir);
            }
        } else {
            list_with(
                &decoder,
                &self.root,
                Path::new(""),
                self.config.recursive,
                output,
            )?;
        }

        debug!(root = %self.root.display(), "walk finished");
        Ok(())
    }

    /**
     Walks the tree and returns the relative paths of every directory found.

     # Errors
     See [`Walker::walk_into`].
    */
    #[inline]
    pub fn walk(&self) -> Result<HashSet<PathBuf>> {
        let mut found = HashSet::new();
        self.walk_into(&mut found)?;
        Ok(found)
    }
}
