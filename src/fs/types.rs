use crate::WalkError;
use core::ffi::CStr;

///Generic result type for directory walking operations
pub type Result<T> = core::result::Result<T, WalkError>;

/**
 An owned file descriptor for a directory opened for listing.

 The descriptor is closed when this value is dropped, so every exit path out of a
 listing (early error returns included) releases it.
*/
#[derive(Debug)]
#[repr(transparent)]
pub struct FileDes(pub(crate) i32);

impl FileDes {
    /**
     Opens `path` as a directory for reading.

     Flags: `O_RDONLY | O_CLOEXEC | O_DIRECTORY | O_NONBLOCK`, so a non-directory fails
     with `ENOTDIR` at open time rather than on the first read.

     # Errors
     Returns the raw `io::Error` from `open(2)`; the caller decides which codes matter.
    */
    #[inline]
    pub fn open_dir(path: &CStr) -> std::io::Result<Self> {
        const FLAGS: i32 = libc::O_RDONLY | libc::O_CLOEXEC | libc::O_DIRECTORY | libc::O_NONBLOCK;
        // SAFETY: the pointer is null terminated
        let fd = unsafe { libc::open(path.as_ptr(), FLAGS) };

        if fd < 0 {
            return Err(last_os_error!());
        }
        Ok(Self(fd))
    }

    /// Checks if the file descriptor is currently open
    #[must_use]
    #[inline]
    pub fn is_open(&self) -> bool {
        // F_GETFD fails with EBADF on a closed descriptor
        //SAFETY:  Always safe
        unsafe { libc::fcntl(self.0, libc::F_GETFD) != -1 }
    }
}

impl Drop for FileDes {
    #[inline]
    fn drop(&mut self) {
        debug_assert!(
            self.is_open(),
            "We expect the file descriptor to be open before closing"
        );
        // SAFETY: we own the descriptor and only close it here
        unsafe { libc::close(self.0) };
    }
}
