//! Length-encoded integer/string helpers shared by the packet parsers.
//!
//! Wire format (`Protocol::LengthEncodedInteger`):
//! first byte < 0xfb -> the value itself; 0xfb -> NULL (string context only);
//! 0xfc -> followed by a 2-byte little-endian int; 0xfd -> 3 bytes;
//! 0xfe -> 8 bytes.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::{CResult, MySqlError};

const NULL_MARKER: u8 = 0xfb;
const TWO_BYTE_MARKER: u8 = 0xfc;
const THREE_BYTE_MARKER: u8 = 0xfd;
const EIGHT_BYTE_MARKER: u8 = 0xfe;

/// Returns `(bytes_consumed, value)`.
pub fn read_len_enc_num_with_cursor(cursor: &mut Cursor<&[u8]>) -> CResult<(usize, u64)> {
    let first = cursor.read_u8()?;
    match first {
        0..=0xfa => Ok((1, first as u64)),
        TWO_BYTE_MARKER => Ok((3, cursor.read_u16::<LittleEndian>()? as u64)),
        THREE_BYTE_MARKER => {
            let value = cursor.read_u24::<LittleEndian>()?;
            Ok((4, value as u64))
        }
        EIGHT_BYTE_MARKER => Ok((9, cursor.read_u64::<LittleEndian>()?)),
        NULL_MARKER => Err(MySqlError::interface(
            "unexpected NULL marker in length-encoded integer context",
        )),
        other => Err(MySqlError::interface(format!(
            "invalid length-encoded integer marker byte {other:#x}"
        ))),
    }
}

pub fn read_len_enc_num(cursor: &mut Cursor<&[u8]>) -> CResult<(usize, u64)> {
    read_len_enc_num_with_cursor(cursor)
}

/// Reads a length-encoded string. Errors if the NULL marker is seen; use
/// [`read_len_enc_str_with_cursor_allow_null`] where NULL is a valid cell
/// value (text result-set rows).
pub fn read_len_enc_str_with_cursor(cursor: &mut Cursor<&[u8]>) -> CResult<String> {
    let (_, len) = read_len_enc_num_with_cursor(cursor)?;
    let mut buf = vec![0u8; len as usize];
    cursor.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| MySqlError::interface(format!("invalid utf8: {e}")))
}

/// Text result-set row cells: a length-encoded string, or `0xfb` for NULL.
pub fn read_len_enc_str_with_cursor_allow_null(
    cursor: &mut Cursor<&[u8]>,
) -> CResult<Option<String>> {
    let marker = {
        let pos = cursor.position() as usize;
        cursor.get_ref()[pos]
    };
    if marker == NULL_MARKER {
        cursor.set_position(cursor.position() + 1);
        return Ok(None);
    }
    Ok(Some(read_len_enc_str_with_cursor(cursor)?))
}

/// Same as above but returning raw bytes (for BLOB/binary columns where the
/// content is not valid UTF-8).
pub fn read_len_enc_bytes_with_cursor_allow_null(
    cursor: &mut Cursor<&[u8]>,
) -> CResult<Option<Vec<u8>>> {
    let marker = {
        let pos = cursor.position() as usize;
        cursor.get_ref()[pos]
    };
    if marker == NULL_MARKER {
        cursor.set_position(cursor.position() + 1);
        return Ok(None);
    }
    let (_, len) = read_len_enc_num_with_cursor(cursor)?;
    let mut buf = vec![0u8; len as usize];
    cursor.read_exact(&mut buf)?;
    Ok(Some(buf))
}

pub fn read_null_term_string_with_cursor(cursor: &mut Cursor<&[u8]>) -> CResult<String> {
    let mut buf = Vec::new();
    loop {
        let b = cursor.read_u8()?;
        if b == 0 {
            break;
        }
        buf.push(b);
    }
    String::from_utf8(buf).map_err(|e| MySqlError::interface(format!("invalid utf8: {e}")))
}

pub fn write_len_enc_num(buf: &mut Vec<u8>, value: u64) {
    use byteorder::WriteBytesExt;
    use std::io::Write;

    if value < 0xfb {
        buf.write_u8(value as u8).unwrap();
    } else if value <= 0xffff {
        buf.write_u8(TWO_BYTE_MARKER).unwrap();
        buf.write_u16::<LittleEndian>(value as u16).unwrap();
    } else if value <= 0xff_ffff {
        buf.write_u8(THREE_BYTE_MARKER).unwrap();
        buf.write_u24::<LittleEndian>(value as u32).unwrap();
    } else {
        buf.write_u8(EIGHT_BYTE_MARKER).unwrap();
        buf.write_u64::<LittleEndian>(value).unwrap();
    }
    let _ = buf.write(&[]);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_small_int() {
        let mut buf = Vec::new();
        write_len_enc_num(&mut buf, 42);
        let mut cursor = Cursor::new(buf.as_slice());
        let (consumed, value) = read_len_enc_num_with_cursor(&mut cursor).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(value, 42);
    }

    #[test]
    fn round_trips_large_int() {
        let mut buf = Vec::new();
        write_len_enc_num(&mut buf, 1_000_000);
        let mut cursor = Cursor::new(buf.as_slice());
        let (_, value) = read_len_enc_num_with_cursor(&mut cursor).unwrap();
        assert_eq!(value, 1_000_000);
    }

    #[test]
    fn reads_null_string() {
        let buf = [NULL_MARKER];
        let mut cursor = Cursor::new(&buf[..]);
        assert_eq!(read_len_enc_str_with_cursor_allow_null(&mut cursor).unwrap(), None);
    }
}
