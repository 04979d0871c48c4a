#[cfg(any(target_os = "linux", target_os = "android"))]
use core::ffi::c_char;

/**
  Wrapper for direct `getdents64` syscalls

 # Arguments
 - `fd`: Open directory file descriptor
 - `buffer_ptr`: Raw pointer to output buffer
 - `buffer_size`: Size of output buffer in bytes

 # Safety
 - Requires valid open directory descriptor
 - Buffer must be valid for writes of `buffer_size` bytes

 # Returns
 - Positive: Number of bytes read
 - 0: End of directory
 - Negative: Error (check errno)
*/
#[inline]
#[cfg(any(target_os = "linux", target_os = "android"))]
pub unsafe fn getdents(fd: i32, buffer_ptr: *mut c_char, buffer_size: usize) -> isize {
    // SAFETY: Syscall has no other implicit safety requirements beyond pointer validity(and precursor conditions met.)
    #[expect(clippy::cast_possible_truncation, reason = "clong is isize on Unix")]
    unsafe {
        libc::syscall(libc::SYS_getdents64, fd, buffer_ptr, buffer_size) as _
    }
}

/// True for the `.` and `..` entries every directory carries
#[must_use]
#[inline]
pub const fn is_dot_or_dot_dot(name: &[u8]) -> bool {
    matches!(name, b"." | b"..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_names() {
        assert!(is_dot_or_dot_dot(b"."));
        assert!(is_dot_or_dot_dot(b".."));
        assert!(!is_dot_or_dot_dot(b"..."));
        assert!(!is_dot_or_dot_dot(b".git"));
        assert!(!is_dot_or_dot_dot(b""));
    }
}
