#![allow(clippy::multiple_unsafe_ops_per_block)] //annoying convention

use crate::WalkError;
use crate::fs::{BUFFER_SIZE, DirentDecoder, Listing, Result};
use core::mem::MaybeUninit;
use std::path::Path;

/**
 An 8-byte aligned, fixed size byte buffer for raw directory reads.

 `getdents64` writes records whose 8 byte fields are naturally aligned relative to the
 start of the buffer, so the buffer itself is aligned to 8.
 The contents start uninitialised; only the prefix a syscall reported as written may be
 read, which is what [`DirBuffer`] tracks.

 # Examples
 ```
 use lsdirs::fs::AlignedBuffer;

 // Purposely set a non-aligned amount to show alignment is forced.
 let buffer = AlignedBuffer::<1026>::new();
 assert!((buffer.as_ptr() as usize) % 8 == 0, "We expect the buffer to be aligned to 8 bytes");
 assert_eq!(buffer.capacity(), 1026);
 ```
*/
#[derive(Debug)]
#[repr(C, align(8))]
pub struct AlignedBuffer<const SIZE: usize> {
    data: MaybeUninit<[u8; SIZE]>,
}

#[allow(clippy::new_without_default)]
impl<const SIZE: usize> AlignedBuffer<SIZE> {
    /// Creates a new uninitialised aligned buffer
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            data: MaybeUninit::uninit(),
        }
    }

    /// Returns a mutable pointer to the buffer's data
    #[inline]
    #[must_use]
    pub const fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr().cast()
    }

    /// Returns a const pointer to the buffer's data
    #[inline]
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr().cast()
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        SIZE
    }

    /**
     Returns the first `len` bytes of the buffer

     # Safety
     The first `len` bytes must have been initialised and `len <= SIZE`.
    */
    #[inline]
    pub const unsafe fn initialised(&self, len: usize) -> &[u8] {
        debug_assert!(len <= SIZE, "slice would run past the buffer");
        // SAFETY: Caller guarantees the prefix is initialised and in bounds
        unsafe { core::slice::from_raw_parts(self.as_ptr(), len) }
    }

    /// Executes the getdents64 system call into this buffer
    #[inline]
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn getdents(&mut self, fd: &crate::fs::FileDes) -> isize {
        // SAFETY: we're passing a valid buffer of SIZE bytes
        unsafe { crate::util::getdents(fd.0, self.as_mut_ptr().cast(), SIZE) }
    }
}

/**
 The walker's read buffer plus its two cursors.

 - `valid_len`: bytes filled by the last raw read
 - `read_pos`: bytes of that fill already decoded

 `0 <= read_pos <= valid_len <= capacity` holds at all times. Once `read_pos` catches up
 with `valid_len` the buffer is drained and the next refill resets both.
*/
#[derive(Debug)]
pub struct DirBuffer {
    data: AlignedBuffer<BUFFER_SIZE>,
    valid_len: usize,
    read_pos: usize,
}

#[allow(clippy::new_without_default)]
impl DirBuffer {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            data: AlignedBuffer::new(),
            valid_len: 0,
            read_pos: 0,
        }
    }

    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        BUFFER_SIZE
    }

    /// Bytes filled by the last read
    #[must_use]
    #[inline]
    pub const fn valid_len(&self) -> usize {
        self.valid_len
    }

    /// Bytes of the current fill already decoded
    #[must_use]
    #[inline]
    pub const fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Everything in the current fill has been decoded
    #[must_use]
    #[inline]
    pub const fn is_drained(&self) -> bool {
        self.read_pos >= self.valid_len
    }

    /// The filled but not yet decoded bytes
    #[must_use]
    #[inline]
    pub fn window(&self) -> &[u8] {
        // SAFETY: [0, valid_len) was written by the last fill and valid_len <= BUFFER_SIZE
        let filled = unsafe { self.data.initialised(self.valid_len) };
        filled.get(self.read_pos..).unwrap_or_default()
    }

    /// Marks `count` more bytes as decoded, never moving past `valid_len`
    #[inline]
    pub fn advance(&mut self, count: usize) {
        debug_assert!(
            self.read_pos + count <= self.valid_len,
            "advanced past the filled region"
        );
        self.read_pos = self.read_pos.saturating_add(count).min(self.valid_len);
    }

    /**
     Refills the buffer from `fd` with one `getdents64` call and resets the cursor.

     Returns the number of bytes read, 0 at end of directory.

     # Errors
     Returns the OS error when the syscall fails; the cursors are left drained.
    */
    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[inline]
    pub fn refill(&mut self, fd: &crate::fs::FileDes) -> std::io::Result<usize> {
        let read = self.data.getdents(fd);
        self.read_pos = 0;

        let Ok(read) = usize::try_from(read) else {
            self.valid_len = 0;
            return Err(last_os_error!());
        };

        self.valid_len = read.min(BUFFER_SIZE);
        Ok(self.valid_len)
    }

    /**
     Decodes the current window into `listing` and advances past what was consumed.

     `path` is only used to label the error.

     # Errors
     [`WalkError::MalformedStream`] when the decoder can't consume anything from a
     non-empty window, the cursor is left where it was.
    */
    #[inline]
    pub fn decode_window(
        &mut self,
        decoder: &DirentDecoder,
        listing: &mut Listing,
        path: &Path,
    ) -> Result<()> {
        let window = self.window();
        let consumed = decoder.decode(window, listing);
        if consumed == 0 && !window.is_empty() {
            return Err(WalkError::MalformedStream {
                path: path.to_path_buf(),
                offset: self.read_pos,
                remaining: window.len(),
            });
        }
        self.advance(consumed);
        Ok(())
    }

    /**
     Loads `bytes` as if a raw read had just returned them, truncated to the capacity.

     Returns the number of bytes loaded. Used to replay captured directory streams.
    */
    #[inline]
    pub fn load(&mut self, bytes: &[u8]) -> usize {
        let len = bytes.len().min(BUFFER_SIZE);
        // SAFETY: `len` is within both the source slice and the buffer, and the two regions
        // can't overlap because the buffer is exclusively borrowed
        unsafe { core::ptr::copy_nonoverlapping(bytes.as_ptr(), self.data.as_mut_ptr(), len) };
        self.valid_len = len;
        self.read_pos = 0;
        len
    }
}
