mod buffer;
mod decoder;
#[cfg(any(target_os = "linux", target_os = "android"))]
mod dir;
mod layout;
mod types;

pub use buffer::{AlignedBuffer, DirBuffer};
pub use decoder::{DirentDecoder, DirentRecord, Listing};
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use dir::{DirStream, READ_OP, read_directory_names};
pub use layout::{ByteOrder, DirentLayout, Field, FieldReader, FieldWidth};
pub use types::{FileDes, Result};

crate::const_from_env!(
    /// Capacity of the buffer each directory listing reads into.
    /// Override at build time with `LSDIRS_BUFFER_SIZE`.
    BUFFER_SIZE: usize = "LSDIRS_BUFFER_SIZE", 8192
);

crate::const_assert!(BUFFER_SIZE >= 4096, "Buffer size too small!");
crate::const_assert!(
    BUFFER_SIZE % 8 == 0,
    "Buffer size must keep records 8 byte aligned"
);
