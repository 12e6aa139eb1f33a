//! # Binary Read Primitives
//!
//! Little-endian field readers shared by the archive container and the
//! interval index parser. These speak `io::Result`; callers map failures
//! into the crate error taxonomy with file context attached.

use std::io::{self, Read};

/// Strings longer than this are treated as corruption, not data.
pub const MAX_STRING_LEN: usize = 1 << 20;

pub fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64_le<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_f32_le<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string (u32 length, then bytes).
pub fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = read_u32_le(reader)? as usize;
    if len > MAX_STRING_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("string length {len} exceeds limit"),
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
