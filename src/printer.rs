use lsdirs::WalkError;
use std::io::{self, BufWriter, Write, stdout};
use std::os::unix::ffi::OsStrExt as _;
use std::path::{Path, PathBuf};

const NEWLINE: &[u8] = b"\n";
const NUL: &[u8] = b"\0";

/// Writes one path per record to stdout, prefixed with `base` when given.
///
/// A closed pipe (eg `lsdirs -r / | head`) ends output quietly.
pub fn write_dirs<'a, I>(dirs: I, base: Option<&Path>, print0: bool) -> Result<(), WalkError>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let std_out = stdout();
    let mut writer = BufWriter::new(std_out.lock());

    match write_all(&mut writer, dirs, base, print0) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.map_err(WalkError::Write),
    }
}

fn write_all<'a, W, I>(writer: &mut W, dirs: I, base: Option<&Path>, print0: bool) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a PathBuf>,
{
    let terminator = if print0 { NUL } else { NEWLINE };

    for dir in dirs {
        match base {
            Some(base) => writer.write_all(base.join(dir).as_os_str().as_bytes())?,
            None => writer.write_all(dir.as_os_str().as_bytes())?,
        }
        writer.write_all(terminator)?;
    }
    writer.flush()
}
