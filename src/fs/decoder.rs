/*!
 Decoding of raw directory-entry streams.

 A single `getdents64` call fills a buffer with back-to-back variable length records.
 [`DirentDecoder::decode`] walks such a buffer, keeps directory names and reports how many
 bytes it managed to validate, so the caller can advance its cursor.

 Nothing in here allocates per record. Names are only copied out once an entry is known
 to be a directory that isn't `.` or `..`.
*/
use crate::fs::layout::{DirentLayout, FieldReader};
use crate::util::is_dot_or_dot_dot;
use std::{ffi::OsStr, ffi::OsString, os::unix::ffi::OsStrExt as _};

/// Names collected from one or more decoded buffers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Directory names, in the order they appeared in the stream
    pub dirs: Vec<OsString>,
    /// Names whose type the filesystem reported as unknown.
    /// Only filled when the decoder was built with [`DirentDecoder::with_unknown`].
    pub unknown: Vec<OsString>,
}

impl Listing {
    #[must_use]
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dirs: Vec::with_capacity(capacity),
            unknown: Vec::new(),
        }
    }
}

/**
 A borrowed view of one record inside a directory-entry buffer.

 The view is exactly `record_len` bytes long. Field accessors return `None` when the field
 does not fit inside the record.
*/
#[derive(Debug, Clone, Copy)]
pub struct DirentRecord<'buf, 'dec> {
    bytes: &'buf [u8],
    decoder: &'dec DirentDecoder,
}

impl<'buf> DirentRecord<'buf, '_> {
    /// Bytes occupied by this record, padding included
    #[must_use]
    #[inline]
    pub const fn record_len(&self) -> usize {
        self.bytes.len()
    }

    /// The raw bytes of the record
    #[must_use]
    #[inline]
    pub const fn as_bytes(&self) -> &'buf [u8] {
        self.bytes
    }

    #[must_use]
    #[inline]
    pub fn inode(&self) -> Option<u64> {
        self.decoder.inode.read(self.bytes)
    }

    #[must_use]
    #[inline]
    pub fn entry_type(&self) -> Option<u64> {
        self.decoder.entry_type.read(self.bytes)
    }

    /**
     The entry name, cut at the first NUL byte.

     The name field runs from the layout's name offset to the end of the record. It may be
     NUL terminated, zero padded, or fill the record with no terminator at all.
     Returns `None` if the name offset lies past the end of the record.
    */
    #[must_use]
    #[inline]
    pub fn name(&self) -> Option<&'buf [u8]> {
        let raw = self.bytes.get(self.decoder.layout.name_offset..)?;
        Some(raw.split(|&byte| byte == 0).next().unwrap_or(raw))
    }
}

/// What a single validated record amounts to
enum Decoded<'buf> {
    Skip,
    Directory(&'buf [u8]),
    Unknown(&'buf [u8]),
}

/**
 Stateless decoder for one native directory-entry record format.

 Field readers are chosen once from the [`DirentLayout`] when the decoder is built.

 # Examples
 ```
 use lsdirs::fs::{ByteOrder, DirentDecoder, DirentLayout, Field, FieldWidth, Listing};

 // a small made up format: u32 inode, u16 reclen, u8 type, name at 7
 let layout = DirentLayout {
     inode: Field::new(0, FieldWidth::U32),
     record_len: Field::new(4, FieldWidth::U16),
     entry_type: Field::new(6, FieldWidth::U8),
     name_offset: 7,
     dir_type: 4,
     unknown_type: 0,
     byte_order: ByteOrder::Little,
 };
 let record = [1, 0, 0, 0, 12, 0, 4, b'd', b'a', b't', b'a', 0];
 let mut listing = Listing::default();
 let consumed = DirentDecoder::new(layout).decode(&record, &mut listing);
 assert_eq!(consumed, 12);
 assert_eq!(listing.dirs, ["data"]);
 ```
*/
#[derive(Debug, Clone, Copy)]
pub struct DirentDecoder {
    layout: DirentLayout,
    inode: FieldReader,
    record_len: FieldReader,
    entry_type: FieldReader,
    collect_unknown: bool,
}

impl DirentDecoder {
    #[must_use]
    #[inline]
    pub const fn new(layout: DirentLayout) -> Self {
        Self {
            layout,
            inode: layout.inode.reader(layout.byte_order),
            record_len: layout.record_len.reader(layout.byte_order),
            entry_type: layout.entry_type.reader(layout.byte_order),
            collect_unknown: false,
        }
    }

    /// A decoder for the records `getdents64` produces on this machine
    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[must_use]
    #[inline]
    pub const fn native() -> Self {
        Self::new(DirentLayout::NATIVE)
    }

    /// Also collect names of entries whose type is unknown, so the caller can resolve them
    #[must_use]
    #[inline]
    pub const fn with_unknown(mut self, collect: bool) -> Self {
        self.collect_unknown = collect;
        self
    }

    /**
     Splits the first record off the front of `buf`.

     Returns `None` when the record length can't be read or claims more bytes than `buf`
     holds, i.e. the record is truncated.
    */
    #[must_use]
    #[inline]
    pub fn next_record<'buf>(&self, buf: &'buf [u8]) -> Option<DirentRecord<'buf, '_>> {
        let record_len = usize::try_from(self.record_len.read(buf)?).ok()?;
        let bytes = buf.get(..record_len)?;
        Some(DirentRecord {
            bytes,
            decoder: self,
        })
    }

    /**
     Decodes every complete record at the front of `buf`, appending directory names to
     `out.dirs` (and unknown-type names to `out.unknown` if enabled).

     Returns the number of bytes consumed. Two stop conditions exist:
     - the next record's length is unreadable or runs past the end of `buf`: decoding stops
       and the names gathered so far stand.
     - a field inside an in-bounds record (inode, type, name) can't be read: decoding of
       this buffer is abandoned at that record.

     In both cases the returned count stops at the start of the offending record. A return
     of 0 for a non-empty `buf` means no progress is possible.
    */
    #[inline]
    pub fn decode(&self, buf: &[u8], out: &mut Listing) -> usize {
        let mut consumed = 0;

        while let Some(record) = buf.get(consumed..).and_then(|rest| self.next_record(rest)) {
            let Some(decoded) = self.classify(&record) else {
                break;
            };

            match decoded {
                Decoded::Skip => {}
                Decoded::Directory(name) => out.dirs.push(OsStr::from_bytes(name).to_os_string()),
                Decoded::Unknown(name) => {
                    out.unknown.push(OsStr::from_bytes(name).to_os_string());
                }
            }

            consumed += record.record_len();
        }

        consumed
    }

    /// `None` aborts decoding at this record
    #[inline]
    fn classify<'buf>(&self, record: &DirentRecord<'buf, '_>) -> Option<Decoded<'buf>> {
        let inode = record.inode()?;
        if inode == 0 {
            // deleted entry the filesystem hasn't reclaimed yet
            return Some(Decoded::Skip);
        }

        let entry_type = record.entry_type()?;
        let is_dir = entry_type == self.layout.dir_type;
        if !is_dir && !(self.collect_unknown && entry_type == self.layout.unknown_type) {
            return Some(Decoded::Skip);
        }

        let name = record.name()?;
        if name.is_empty() || is_dot_or_dot_dot(name) {
            return Some(Decoded::Skip);
        }

        Some(if is_dir {
            Decoded::Directory(name)
        } else {
            Decoded::Unknown(name)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fs::layout::{ByteOrder, Field, FieldWidth};
    use std::os::unix::ffi::OsStrExt as _;

    const DT_DIR: u8 = 4;
    const DT_REG: u8 = 8;
    const DT_LNK: u8 = 10;
    const DT_UNKNOWN: u8 = 0;

    /// Same shape as `linux_dirent64`, spelled out so these tests run anywhere
    pub(crate) const LINUX_LIKE: DirentLayout = DirentLayout {
        inode: Field::new(0, FieldWidth::U64),
        record_len: Field::new(16, FieldWidth::U16),
        entry_type: Field::new(18, FieldWidth::U8),
        name_offset: 19,
        dir_type: DT_DIR as u64,
        unknown_type: DT_UNKNOWN as u64,
        byte_order: ByteOrder::NATIVE,
    };

    /// Record length ahead of the inode, so a record too short for the inode can still be sized
    const RECLEN_FIRST: DirentLayout = DirentLayout {
        inode: Field::new(2, FieldWidth::U64),
        record_len: Field::new(0, FieldWidth::U16),
        entry_type: Field::new(10, FieldWidth::U8),
        name_offset: 11,
        dir_type: DT_DIR as u64,
        unknown_type: DT_UNKNOWN as u64,
        byte_order: ByteOrder::Big,
    };

    /// A big-endian BSD flavoured layout with the name aligned to 8
    const BIG_ENDIAN: DirentLayout = DirentLayout {
        inode: Field::new(0, FieldWidth::U32),
        record_len: Field::new(4, FieldWidth::U16),
        entry_type: Field::new(6, FieldWidth::U8),
        name_offset: 8,
        dir_type: DT_DIR as u64,
        unknown_type: DT_UNKNOWN as u64,
        byte_order: ByteOrder::Big,
    };

    fn put(buf: &mut [u8], field: Field, order: ByteOrder, value: u64) {
        let width = field.width.bytes();
        let bytes = match order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        let src = match order {
            ByteOrder::Little => &bytes[..width],
            ByteOrder::Big => &bytes[8 - width..],
        };
        buf[field.offset..field.end()].copy_from_slice(src);
    }

    /// Builds one record, NUL terminated and padded to a multiple of 8
    pub(crate) fn record(layout: &DirentLayout, inode: u64, d_type: u8, name: &[u8]) -> Vec<u8> {
        let len = (layout.name_offset + name.len() + 1).next_multiple_of(8);
        record_with_len(layout, inode, d_type, name, len)
    }

    /// Builds one record with an explicit record length, the name is copied as far as it fits
    pub(crate) fn record_with_len(
        layout: &DirentLayout,
        inode: u64,
        d_type: u8,
        name: &[u8],
        len: usize,
    ) -> Vec<u8> {
        let mut buf = vec![0u8; len.max(layout.header_len())];
        put(&mut buf, layout.inode, layout.byte_order, inode);
        put(&mut buf, layout.record_len, layout.byte_order, len as u64);
        put(&mut buf, layout.entry_type, layout.byte_order, u64::from(d_type));
        let room = buf.len() - layout.name_offset;
        let copied = name.len().min(room);
        buf[layout.name_offset..layout.name_offset + copied].copy_from_slice(&name[..copied]);
        buf.truncate(len);
        buf
    }

    fn stream(records: &[Vec<u8>]) -> Vec<u8> {
        records.concat()
    }

    fn decode(layout: DirentLayout, buf: &[u8]) -> (usize, Vec<OsString>) {
        let mut listing = Listing::default();
        let consumed = DirentDecoder::new(layout).decode(buf, &mut listing);
        (consumed, listing.dirs)
    }

    #[test]
    fn keeps_only_directories_in_order() {
        let buf = stream(&[
            record(&LINUX_LIKE, 11, DT_DIR, b"alpha"),
            record(&LINUX_LIKE, 12, DT_REG, b"file.txt"),
            record(&LINUX_LIKE, 13, DT_LNK, b"link_to_dir"),
            record(&LINUX_LIKE, 14, DT_DIR, b"beta"),
        ]);
        let (consumed, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(consumed, buf.len());
        assert_eq!(names, ["alpha", "beta"]);
    }

    #[test]
    fn dot_entries_are_dropped() {
        let buf = stream(&[
            record(&LINUX_LIKE, 2, DT_DIR, b"."),
            record(&LINUX_LIKE, 1, DT_DIR, b".."),
            record(&LINUX_LIKE, 3, DT_DIR, b"..."),
            record(&LINUX_LIKE, 4, DT_DIR, b".hidden"),
        ]);
        let (consumed, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(consumed, buf.len());
        assert_eq!(names, ["...", ".hidden"]);
    }

    #[test]
    fn tombstones_are_consumed_but_not_reported() {
        let buf = stream(&[
            record(&LINUX_LIKE, 0, DT_DIR, b"deleted"),
            record(&LINUX_LIKE, 7, DT_DIR, b"alive"),
        ]);
        let (consumed, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(consumed, buf.len());
        assert_eq!(names, ["alive"]);
    }

    #[test]
    fn truncated_tail_is_left_unconsumed() {
        let first = record(&LINUX_LIKE, 5, DT_DIR, b"complete");
        let second = record(&LINUX_LIKE, 6, DT_DIR, b"cut_short_by_the_buffer");
        let mut buf = stream(&[first.clone(), second]);
        buf.truncate(first.len() + 20);

        let (consumed, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(consumed, first.len());
        assert!(consumed < buf.len());
        assert_eq!(names, ["complete"]);
    }

    #[test]
    fn tail_too_short_for_record_length() {
        let first = record(&LINUX_LIKE, 5, DT_DIR, b"one");
        let mut buf = first.clone();
        buf.extend_from_slice(&[0xaa; 17]); // reclen lives at 16..18

        let (consumed, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(consumed, first.len());
        assert_eq!(names, ["one"]);
    }

    #[test]
    fn padded_name_stops_at_first_nul() {
        let mut rec = record_with_len(&LINUX_LIKE, 9, DT_DIR, b"name", 48);
        // garbage after the terminator must not leak into the name
        rec[LINUX_LIKE.name_offset + 6] = b'x';
        let (consumed, names) = decode(LINUX_LIKE, &rec);
        assert_eq!(consumed, 48);
        assert_eq!(names, ["name"]);
    }

    #[test]
    fn name_without_terminator_fills_the_record() {
        // 19 + 5 = 24, no room left for a NUL
        let rec = record_with_len(&LINUX_LIKE, 9, DT_DIR, b"exact", 24);
        assert!(rec[19..].iter().all(|&b| b != 0));
        let (consumed, names) = decode(LINUX_LIKE, &rec);
        assert_eq!(consumed, 24);
        assert_eq!(names, ["exact"]);
    }

    #[test]
    fn zero_record_length_makes_no_progress() {
        let good = record(&LINUX_LIKE, 3, DT_DIR, b"kept");
        let mut bad = record_with_len(&LINUX_LIKE, 4, DT_DIR, b"", 24);
        put(&mut bad, LINUX_LIKE.record_len, LINUX_LIKE.byte_order, 0);

        let (consumed, names) = decode(LINUX_LIKE, &bad);
        assert_eq!((consumed, names.len()), (0, 0));

        let buf = stream(&[good.clone(), bad]);
        let (consumed, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(consumed, good.len());
        assert_eq!(names, ["kept"]);
    }

    #[test]
    fn unreadable_inode_aborts_the_buffer() {
        let good = record(&RECLEN_FIRST, 1, DT_DIR, b"a");
        // a 4 byte record can't hold the inode at 2..10
        let mut tiny = vec![0u8; 4];
        put(&mut tiny, RECLEN_FIRST.record_len, RECLEN_FIRST.byte_order, 4);
        let after = record(&RECLEN_FIRST, 2, DT_DIR, b"never_seen");

        let buf = stream(&[good.clone(), tiny, after]);
        let (consumed, names) = decode(RECLEN_FIRST, &buf);
        assert_eq!(consumed, good.len());
        assert_eq!(names, ["a"]);
    }

    #[test]
    fn unreadable_type_aborts_the_buffer() {
        let good = record(&LINUX_LIKE, 1, DT_DIR, b"first");
        // 18 bytes: inode and reclen fit, d_type at 18 does not
        let mut headless = vec![0u8; 18];
        put(&mut headless, LINUX_LIKE.inode, LINUX_LIKE.byte_order, 77);
        put(&mut headless, LINUX_LIKE.record_len, LINUX_LIKE.byte_order, 18);
        let after = record(&LINUX_LIKE, 2, DT_DIR, b"never_seen");

        let buf = stream(&[good.clone(), headless, after]);
        let (consumed, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(consumed, good.len());
        assert_eq!(names, ["first"]);
    }

    #[test]
    fn name_offset_past_record_aborts_the_buffer() {
        let padded = DirentLayout {
            name_offset: 24,
            ..LINUX_LIKE
        };
        let good = record(&padded, 1, DT_DIR, b"ok");
        // 20 bytes holds every integer field but ends before the name starts
        let mut short = vec![0u8; 20];
        put(&mut short, padded.inode, padded.byte_order, 5);
        put(&mut short, padded.record_len, padded.byte_order, 20);
        put(&mut short, padded.entry_type, padded.byte_order, u64::from(DT_DIR));
        let trailing = record(&padded, 6, DT_DIR, b"not_reached");

        let buf = stream(&[good.clone(), short.clone(), trailing]);
        let (consumed, names) = decode(padded, &buf);
        assert_eq!(consumed, good.len());
        assert_eq!(names, ["ok"]);

        // the same short record typed as a file is skipped before the name is looked at
        put(&mut short, padded.entry_type, padded.byte_order, u64::from(DT_REG));
        let (consumed, names) = decode(padded, &short);
        assert_eq!(consumed, 20);
        assert!(names.is_empty());
    }

    #[test]
    fn big_endian_layout() {
        let buf = stream(&[
            record(&BIG_ENDIAN, 0x0102_0304, DT_DIR, b"usr"),
            record(&BIG_ENDIAN, 0x0a0b_0c0d, DT_REG, b"vmlinuz"),
            record(&BIG_ENDIAN, 0x0000_0100, DT_DIR, b"var"),
        ]);
        // record length is 16 for "usr", stored as 00 10
        assert_eq!(&buf[4..6], &[0x00, 0x10]);

        let (consumed, names) = decode(BIG_ENDIAN, &buf);
        assert_eq!(consumed, buf.len());
        assert_eq!(names, ["usr", "var"]);
    }

    #[test]
    fn unknown_types_only_collected_when_asked() {
        let buf = stream(&[
            record(&LINUX_LIKE, 1, DT_UNKNOWN, b"mystery"),
            record(&LINUX_LIKE, 2, DT_DIR, b"known"),
            record(&LINUX_LIKE, 3, DT_UNKNOWN, b".."),
        ]);

        let mut listing = Listing::default();
        let decoder = DirentDecoder::new(LINUX_LIKE);
        assert_eq!(decoder.decode(&buf, &mut listing), buf.len());
        assert_eq!(listing.dirs, ["known"]);
        assert!(listing.unknown.is_empty());

        let mut listing = Listing::default();
        let decoder = decoder.with_unknown(true);
        assert_eq!(decoder.decode(&buf, &mut listing), buf.len());
        assert_eq!(listing.dirs, ["known"]);
        assert_eq!(listing.unknown, ["mystery"]);
    }

    #[test]
    fn empty_buffer_is_a_no_op() {
        let (consumed, names) = decode(LINUX_LIKE, &[]);
        assert_eq!(consumed, 0);
        assert!(names.is_empty());
    }

    #[test]
    fn non_utf8_names_survive() {
        let raw: &[u8] = b"caf\xe9";
        let buf = record(&LINUX_LIKE, 1, DT_DIR, raw);
        let (_, names) = decode(LINUX_LIKE, &buf);
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].as_bytes(), raw);
    }

    #[test]
    fn every_truncation_point_is_safe() {
        let records = [
            record(&LINUX_LIKE, 1, DT_DIR, b"one"),
            record(&LINUX_LIKE, 2, DT_REG, b"two.txt"),
            record(&LINUX_LIKE, 3, DT_DIR, b"three_is_a_longer_name"),
        ];
        let buf = stream(&records);
        let boundaries: Vec<usize> = records
            .iter()
            .scan(0, |end, rec| {
                *end += rec.len();
                Some(*end)
            })
            .collect();
        let boundaries = [&[0][..], &boundaries].concat();

        for cut in 0..=buf.len() {
            let (consumed, names) = decode(LINUX_LIKE, &buf[..cut]);
            let expected = boundaries.iter().rev().find(|&&b| b <= cut).copied();
            assert_eq!(Some(consumed), expected, "cut at {cut}");
            assert!(names.len() <= 2);
        }
    }

    #[test]
    fn record_view_accessors() {
        let buf = record(&LINUX_LIKE, 42, DT_DIR, b"docs");
        let decoder = DirentDecoder::new(LINUX_LIKE);
        let rec = decoder.next_record(&buf).expect("complete record");
        assert_eq!(rec.record_len(), 24);
        assert_eq!(rec.inode(), Some(42));
        assert_eq!(rec.entry_type(), Some(u64::from(DT_DIR)));
        assert_eq!(rec.name(), Some(&b"docs"[..]));
        assert_eq!(rec.as_bytes().len(), buf.len());
    }
}
