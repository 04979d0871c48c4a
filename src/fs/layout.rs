/*!
 Platform description of a raw directory-entry record.

 The decoder never hardcodes a struct layout. It is handed a [`DirentLayout`] that says
 where the inode, record length and type fields live, how wide they are, where the name
 starts and which byte order the kernel wrote them in. On Linux/Android the native layout
 is derived from `libc::dirent64` at compile time, see [`DirentLayout::NATIVE`].
*/

/// Byte order used for the multi-byte integer fields of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// The byte order of the build target
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    /// The byte order of the build target
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;
}

/// Width of an unsigned integer field inside a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldWidth {
    U8,
    U16,
    U32,
    U64,
}

impl FieldWidth {
    /// Number of bytes the field occupies
    #[must_use]
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    /// Maps a byte count to a width, `None` for anything but 1/2/4/8
    #[must_use]
    #[inline]
    pub const fn from_bytes(size: usize) -> Option<Self> {
        match size {
            1 => Some(Self::U8),
            2 => Some(Self::U16),
            4 => Some(Self::U32),
            8 => Some(Self::U64),
            _ => None,
        }
    }

    /// Width of the integer type `T`.
    ///
    /// Intended for const contexts, an unsupported size fails the build.
    #[must_use]
    pub const fn of<T>() -> Self {
        match Self::from_bytes(size_of::<T>()) {
            Some(width) => width,
            None => panic!("dirent integer fields must be 1, 2, 4 or 8 bytes wide"),
        }
    }
}

/// Location of one integer field within a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    pub offset: usize,
    pub width: FieldWidth,
}

impl Field {
    #[must_use]
    #[inline]
    pub const fn new(offset: usize, width: FieldWidth) -> Self {
        Self { offset, width }
    }

    /// One past the last byte of the field
    #[must_use]
    #[inline]
    pub const fn end(self) -> usize {
        self.offset + self.width.bytes()
    }

    /// Picks the reader for this field's width and `order` up front, so decoding a record
    /// never branches on either.
    #[must_use]
    #[inline]
    pub const fn reader(self, order: ByteOrder) -> FieldReader {
        let read: fn(&[u8]) -> Option<u64> = match (self.width, order) {
            (FieldWidth::U8, _) => read_u8,
            (FieldWidth::U16, ByteOrder::Little) => read_u16_le,
            (FieldWidth::U16, ByteOrder::Big) => read_u16_be,
            (FieldWidth::U32, ByteOrder::Little) => read_u32_le,
            (FieldWidth::U32, ByteOrder::Big) => read_u32_be,
            (FieldWidth::U64, ByteOrder::Little) => read_u64_le,
            (FieldWidth::U64, ByteOrder::Big) => read_u64_be,
        };
        FieldReader {
            offset: self.offset,
            read,
        }
    }
}

/**
 A bounds checked reader for one field, bound to a width and byte order.

 Reading returns `None` when the record is too short to hold the field.
*/
#[derive(Debug, Clone, Copy)]
pub struct FieldReader {
    offset: usize,
    read: fn(&[u8]) -> Option<u64>,
}

impl FieldReader {
    /// Reads the field out of `record`, widened to `u64`
    #[must_use]
    #[inline]
    pub fn read(&self, record: &[u8]) -> Option<u64> {
        (self.read)(record.get(self.offset..)?)
    }
}

#[inline]
fn read_u8(bytes: &[u8]) -> Option<u64> {
    bytes.first().copied().map(u64::from)
}

macro_rules! fixed_readers {
    ($($name:ident => $int:ty, $len:literal, $from:ident;)+) => {
        $(
            #[inline]
            fn $name(bytes: &[u8]) -> Option<u64> {
                bytes
                    .first_chunk::<$len>()
                    .map(|chunk| u64::from(<$int>::$from(*chunk)))
            }
        )+
    };
}

fixed_readers! {
    read_u16_le => u16, 2, from_le_bytes;
    read_u16_be => u16, 2, from_be_bytes;
    read_u32_le => u32, 4, from_le_bytes;
    read_u32_be => u32, 4, from_be_bytes;
    read_u64_le => u64, 8, from_le_bytes;
    read_u64_be => u64, 8, from_be_bytes;
}

/// Field offsets, widths and type codes of one native directory-entry format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirentLayout {
    /// Inode number, 0 marks a deleted slot
    pub inode: Field,
    /// Total bytes this record occupies, padding included
    pub record_len: Field,
    /// Entry type code (`DT_*`)
    pub entry_type: Field,
    /// Offset where the name bytes start
    pub name_offset: usize,
    /// Type code for a directory
    pub dir_type: u64,
    /// Type code for "the filesystem didn't say"
    pub unknown_type: u64,
    pub byte_order: ByteOrder,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod native {
    use core::mem::offset_of;
    use libc::dirent64;

    // d_ino (u64) | d_off (i64) | d_reclen (u16) | d_type (u8) | d_name
    // The widths below are implied by the packing, checked here.
    crate::const_assert!(
        offset_of!(dirent64, d_off) - offset_of!(dirent64, d_ino) == size_of::<u64>(),
        "d_ino is expected to be 8 bytes"
    );
    crate::const_assert!(
        offset_of!(dirent64, d_type) - offset_of!(dirent64, d_reclen) == size_of::<u16>(),
        "d_reclen is expected to be 2 bytes"
    );
    crate::const_assert!(
        offset_of!(dirent64, d_name) - offset_of!(dirent64, d_type) == size_of::<u8>(),
        "d_type is expected to be 1 byte"
    );
    crate::const_assert!(offset_of!(dirent64, d_name) == 19);

    pub(super) const INODE: usize = offset_of!(dirent64, d_ino);
    pub(super) const RECORD_LEN: usize = offset_of!(dirent64, d_reclen);
    pub(super) const ENTRY_TYPE: usize = offset_of!(dirent64, d_type);
    pub(super) const NAME: usize = offset_of!(dirent64, d_name);
}

impl DirentLayout {
    /// Layout of `struct linux_dirent64` as returned by `getdents64`
    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[allow(clippy::as_conversions)]
    pub const NATIVE: Self = Self {
        inode: Field::new(native::INODE, FieldWidth::of::<u64>()),
        record_len: Field::new(native::RECORD_LEN, FieldWidth::of::<u16>()),
        entry_type: Field::new(native::ENTRY_TYPE, FieldWidth::of::<u8>()),
        name_offset: native::NAME,
        dir_type: libc::DT_DIR as u64,
        unknown_type: libc::DT_UNKNOWN as u64,
        byte_order: ByteOrder::NATIVE,
    };

    /// Smallest record that still holds every fixed field
    #[must_use]
    #[inline]
    pub const fn header_len(&self) -> usize {
        let mut end = self.name_offset;
        if self.inode.end() > end {
            end = self.inode.end();
        }
        if self.record_len.end() > end {
            end = self.record_len.end();
        }
        if self.entry_type.end() > end {
            end = self.entry_type.end();
        }
        end
    }
}
