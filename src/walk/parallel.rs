/*!
 Work-stealing recursive walk.

 Each worker owns a LIFO deque of pending directories so it mostly continues depth first
 on its own subtree, and steals from the global injector or its siblings when it runs dry.
 Results go into a shared `DashSet`; the first error is parked in a one slot channel and
 raises a flag that stops everyone picking up new work.
*/
use crate::{
    WalkError,
    fs::{DirentDecoder, Result, read_directory_names},
};
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use core::time::Duration;
use crossbeam_channel::{Receiver, Sender, bounded};
use crossbeam_deque::{Injector, Stealer, Worker};
use dashmap::DashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Failed steal rounds before an idle worker starts sleeping between attempts
const MAX_IDLE_SPINS: u32 = 64;
const IDLE_BACKOFF: Duration = Duration::from_micros(100);

/// A directory waiting to be listed
#[derive(Debug)]
struct Task {
    /// Path to open
    path: PathBuf,
    /// Path relative to the walk root, used as the prefix for its children
    relative: PathBuf,
}

struct Shared<'a, L> {
    /// Lists the sub-directory names of one directory
    list: &'a L,
    injector: Injector<Task>,
    stealers: Vec<Stealer<Task>>,
    found: DashSet<PathBuf>,
    /// Tasks queued or being processed, the walk is over when it hits 0
    pending: AtomicUsize,
    abort: AtomicBool,
    errors: Sender<WalkError>,
}

/// Releases one unit of `pending` when a task is done, however it ends.
/// A worker unwinding out of a task also stops the others.
struct TaskGuard<'a> {
    pending: &'a AtomicUsize,
    abort: &'a AtomicBool,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.abort.store(true, Ordering::Relaxed);
        }
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<L> Shared<'_, L>
where
    L: Fn(&Path) -> Result<Vec<OsString>> + Sync,
{
    fn find_task(&self, local: &Worker<Task>) -> Option<Task> {
        local.pop().or_else(|| {
            core::iter::repeat_with(|| {
                self.injector
                    .steal_batch_and_pop(local)
                    .or_else(|| self.stealers.iter().map(Stealer::steal).collect())
            })
            .find(|steal| !steal.is_retry())
            .and_then(crossbeam_deque::Steal::success)
        })
    }

    fn run(&self, local: &Worker<Task>) {
        let mut idle_spins = 0_u32;

        while !self.abort.load(Ordering::Relaxed) {
            match self.find_task(local) {
                Some(task) => {
                    idle_spins = 0;
                    let _guard = TaskGuard {
                        pending: &self.pending,
                        abort: &self.abort,
                    };
                    if let Err(e) = self.process(task, local) {
                        // only the first error is kept, later ones lose the race
                        let _ = self.errors.try_send(e);
                        self.abort.store(true, Ordering::Relaxed);
                    }
                }
                None if self.pending.load(Ordering::Acquire) == 0 => break,
                None if idle_spins < MAX_IDLE_SPINS => {
                    idle_spins += 1;
                    std::thread::yield_now();
                }
                None => std::thread::sleep(IDLE_BACKOFF),
            }
        }
    }

    fn process(&self, task: Task, local: &Worker<Task>) -> Result<()> {
        let names = (self.list)(&task.path)?;

        for name in names {
            let relative = task.relative.join(&name);
            self.found.insert(relative.clone());
            self.pending.fetch_add(1, Ordering::AcqRel);
            local.push(Task {
                path: task.path.join(&name),
                relative,
            });
        }
        Ok(())
    }
}

/**
 Recursively lists every directory below `root` on `threads` workers.

 Returns the same set of relative paths as the sequential walker.

 # Errors
 The first error any worker hits. Workers finish the directory they are on and stop.
 [`WalkError::ThreadPanicked`] if a worker panicked, the rest stop as soon as it unwinds.
*/
#[inline]
pub(crate) fn walk(
    root: &Path,
    decoder: &DirentDecoder,
    threads: NonZeroUsize,
) -> Result<DashSet<PathBuf>> {
    walk_with(root, threads, &|path: &Path| read_directory_names(path, decoder))
}

/// The parallel walk over any directory lister
fn walk_with<L>(root: &Path, threads: NonZeroUsize, list: &L) -> Result<DashSet<PathBuf>>
where
    L: Fn(&Path) -> Result<Vec<OsString>> + Sync,
{
    let workers: Vec<Worker<Task>> = (0..threads.get()).map(|_| Worker::new_lifo()).collect();
    let (errors, first_error): (Sender<WalkError>, Receiver<WalkError>) = bounded(1);

    let shared = Shared {
        list,
        injector: Injector::new(),
        stealers: workers.iter().map(Worker::stealer).collect(),
        found: DashSet::new(),
        pending: AtomicUsize::new(1),
        abort: AtomicBool::new(false),
        errors,
    };
    shared.injector.push(Task {
        path: root.to_path_buf(),
        relative: PathBuf::new(),
    });

    let panicked = std::thread::scope(|scope| {
        let handles: Vec<_> = workers
            .into_iter()
            .map(|local| {
                let shared = &shared;
                scope.spawn(move || shared.run(&local))
            })
            .collect();

        handles
            .into_iter()
            .map(std::thread::ScopedJoinHandle::join)
            .filter(core::result::Result::is_err)
            .count()
    });

    if panicked > 0 {
        return Err(WalkError::ThreadPanicked);
    }
    if let Ok(e) = first_error.try_recv() {
        return Err(e);
    }

    trace!(dirs = shared.found.len(), "parallel walk done");
    Ok(shared.found)
}
