//! Binary (prepared-statement) row format: a leading NULL bitmap followed
//! by one type-tagged value per non-null column.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::{CResult, MySqlError};

use crate::packet::len_enc::read_len_enc_num_with_cursor;
use crate::packet::result_set_column_packet::ResultSetColumnPacket;
use crate::value::{Row, Value};

const UNSIGNED_FLAG: u16 = 0x0020;

mod column_type {
    pub const DECIMAL: u8 = 0;
    pub const TINY: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const LONG: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const DOUBLE: u8 = 5;
    pub const NULL: u8 = 6;
    pub const TIMESTAMP: u8 = 7;
    pub const LONGLONG: u8 = 8;
    pub const INT24: u8 = 9;
    pub const DATE: u8 = 10;
    pub const TIME: u8 = 11;
    pub const DATETIME: u8 = 12;
    pub const YEAR: u8 = 13;
    pub const NEWDATE: u8 = 14;
    pub const VARCHAR: u8 = 15;
    pub const BIT: u8 = 16;
    pub const JSON: u8 = 245;
    pub const NEWDECIMAL: u8 = 246;
    pub const ENUM: u8 = 247;
    pub const SET: u8 = 248;
    pub const TINY_BLOB: u8 = 249;
    pub const MEDIUM_BLOB: u8 = 250;
    pub const LONG_BLOB: u8 = 251;
    pub const BLOB: u8 = 252;
    pub const VAR_STRING: u8 = 253;
    pub const STRING: u8 = 254;
    pub const GEOMETRY: u8 = 255;
}

/// Parses one binary-protocol row. `packet` is the raw packet with its
/// leading `0x00` header byte still attached.
pub fn parse_binary_row(packet: &[u8], columns: &[ResultSetColumnPacket]) -> CResult<Row> {
    let mut cursor = Cursor::new(packet);
    // header byte
    cursor.set_position(1);

    let bitmap_len = (columns.len() + 7 + 2) / 8;
    let pos = cursor.position() as usize;
    let bitmap = &packet[pos..pos + bitmap_len];
    cursor.set_position((pos + bitmap_len) as u64);

    let mut values = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        let bit_index = i + 2;
        let byte = bitmap[bit_index / 8];
        let is_null = (byte & (1 << (bit_index % 8))) != 0;
        if is_null {
            values.push(Value::Null);
            continue;
        }
        values.push(parse_value(&mut cursor, column)?);
    }

    Ok(Row(values))
}

fn parse_value(cursor: &mut Cursor<&[u8]>, column: &ResultSetColumnPacket) -> CResult<Value> {
    let unsigned = column.flags & UNSIGNED_FLAG != 0;

    let value = match column.column_type {
        column_type::TINY => {
            if unsigned {
                Value::UInt(cursor.read_u8()? as u64)
            } else {
                Value::Int(cursor.read_i8()? as i64)
            }
        }
        column_type::SHORT | column_type::YEAR => {
            if unsigned {
                Value::UInt(cursor.read_u16::<LittleEndian>()? as u64)
            } else {
                Value::Int(cursor.read_i16::<LittleEndian>()? as i64)
            }
        }
        column_type::LONG | column_type::INT24 => {
            if unsigned {
                Value::UInt(cursor.read_u32::<LittleEndian>()? as u64)
            } else {
                Value::Int(cursor.read_i32::<LittleEndian>()? as i64)
            }
        }
        column_type::LONGLONG => {
            if unsigned {
                Value::UInt(cursor.read_u64::<LittleEndian>()?)
            } else {
                Value::Int(cursor.read_i64::<LittleEndian>()?)
            }
        }
        column_type::FLOAT => Value::Float(cursor.read_f32::<LittleEndian>()?),
        column_type::DOUBLE => Value::Double(cursor.read_f64::<LittleEndian>()?),
        column_type::DATE | column_type::NEWDATE => parse_date(cursor)?,
        column_type::DATETIME | column_type::TIMESTAMP => parse_datetime(cursor)?,
        column_type::TIME => parse_time(cursor)?,
        column_type::DECIMAL
        | column_type::NEWDECIMAL
        | column_type::VARCHAR
        | column_type::BIT
        | column_type::ENUM
        | column_type::SET
        | column_type::TINY_BLOB
        | column_type::MEDIUM_BLOB
        | column_type::LONG_BLOB
        | column_type::BLOB
        | column_type::VAR_STRING
        | column_type::STRING
        | column_type::JSON
        | column_type::GEOMETRY => {
            let (_, len) = read_len_enc_num_with_cursor(cursor)?;
            let mut buf = vec![0u8; len as usize];
            std::io::Read::read_exact(cursor, &mut buf)?;
            Value::Bytes(buf)
        }
        column_type::NULL => Value::Null,
        other => {
            return Err(MySqlError::interface(format!(
                "unsupported binary column type {other}"
            )))
        }
    };
    Ok(value)
}

fn parse_date(cursor: &mut Cursor<&[u8]>) -> CResult<Value> {
    let len = cursor.read_u8()?;
    if len == 0 {
        return Ok(Value::Date {
            year: 0,
            month: 0,
            day: 0,
        });
    }
    let year = cursor.read_u16::<LittleEndian>()?;
    let month = cursor.read_u8()?;
    let day = cursor.read_u8()?;
    Ok(Value::Date { year, month, day })
}

fn parse_datetime(cursor: &mut Cursor<&[u8]>) -> CResult<Value> {
    let len = cursor.read_u8()?;
    if len == 0 {
        return Ok(Value::DateTime {
            year: 0,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
            micros: 0,
        });
    }
    let year = cursor.read_u16::<LittleEndian>()?;
    let month = cursor.read_u8()?;
    let day = cursor.read_u8()?;
    let (hour, minute, second) = if len >= 7 {
        (cursor.read_u8()?, cursor.read_u8()?, cursor.read_u8()?)
    } else {
        (0, 0, 0)
    };
    let micros = if len >= 11 {
        cursor.read_u32::<LittleEndian>()?
    } else {
        0
    };
    Ok(Value::DateTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
        micros,
    })
}

fn parse_time(cursor: &mut Cursor<&[u8]>) -> CResult<Value> {
    let len = cursor.read_u8()?;
    if len == 0 {
        return Ok(Value::Time {
            negative: false,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            micros: 0,
        });
    }
    let negative = cursor.read_u8()? != 0;
    let days = cursor.read_u32::<LittleEndian>()?;
    let hours = cursor.read_u8()?;
    let minutes = cursor.read_u8()?;
    let seconds = cursor.read_u8()?;
    let micros = if len >= 12 {
        cursor.read_u32::<LittleEndian>()?
    } else {
        0
    };
    Ok(Value::Time {
        negative,
        days,
        hours,
        minutes,
        seconds,
        micros,
    })
}
