use std::io;
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::commands::command::CommandType;
use crate::packet::len_enc::write_len_enc_num;
use crate::value::Value;

/// Binary protocol type tags used when describing bound parameters. Mirrors
/// the subset `binary_row_packet` knows how to decode back.
mod param_type {
    pub const NULL: u8 = 6;
    pub const LONGLONG: u8 = 8;
    pub const DOUBLE: u8 = 5;
    pub const FLOAT: u8 = 4;
    pub const DATE: u8 = 10;
    pub const DATETIME: u8 = 12;
    pub const TIME: u8 = 11;
    pub const VAR_STRING: u8 = 253;
}

const UNSIGNED_FLAG: u8 = 0x80;

/// `COM_STMT_EXECUTE`. `long_data_used` marks parameter indices whose value
/// was already streamed via `STMT_SEND_LONG_DATA`; those are described in
/// the type list but contribute no inline value bytes.
pub struct StmtExecuteCommand<'a> {
    pub statement_id: u32,
    pub flags: u8,
    pub params: &'a [Value],
    pub long_data_used: &'a [bool],
}

impl<'a> StmtExecuteCommand<'a> {
    pub fn new(
        statement_id: u32,
        flags: u8,
        params: &'a [Value],
        long_data_used: &'a [bool],
    ) -> Self {
        Self {
            statement_id,
            flags,
            params,
            long_data_used,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);

        cursor.write_u8(CommandType::StmtExecute as u8)?;
        cursor.write_u32::<LittleEndian>(self.statement_id)?;
        cursor.write_u8(self.flags)?;
        // iteration-count is always 1
        cursor.write_u32::<LittleEndian>(1)?;

        if !self.params.is_empty() {
            let bitmap = null_bitmap(self.params);
            cursor.write_all(&bitmap)?;

            // new-params-bound-flag: always 1, we always describe types.
            cursor.write_u8(1)?;

            for param in self.params {
                let (type_byte, unsigned) = param_type_of(param);
                cursor.write_u8(type_byte)?;
                cursor.write_u8(if unsigned { UNSIGNED_FLAG } else { 0 })?;
            }

            for (param, &is_long_data) in self.params.iter().zip(self.long_data_used) {
                if is_long_data || matches!(param, Value::Null) {
                    continue;
                }
                write_value(&mut vec, param);
            }
        }

        Ok(vec)
    }
}

fn null_bitmap(params: &[Value]) -> Vec<u8> {
    let mut bitmap = vec![0u8; (params.len() + 7) / 8];
    for (i, param) in params.iter().enumerate() {
        if matches!(param, Value::Null) {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    bitmap
}

fn param_type_of(value: &Value) -> (u8, bool) {
    match value {
        Value::Null => (param_type::NULL, false),
        Value::Int(_) => (param_type::LONGLONG, false),
        Value::UInt(_) => (param_type::LONGLONG, true),
        Value::Float(_) => (param_type::FLOAT, false),
        Value::Double(_) => (param_type::DOUBLE, false),
        Value::Bytes(_) => (param_type::VAR_STRING, false),
        Value::Date { .. } => (param_type::DATE, false),
        Value::DateTime { .. } => (param_type::DATETIME, false),
        Value::Time { .. } => (param_type::TIME, false),
    }
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => {}
        Value::Int(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::UInt(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Float(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Bytes(bytes) => {
            write_len_enc_num(buf, bytes.len() as u64);
            buf.extend_from_slice(bytes);
        }
        Value::Date { year, month, day } => {
            buf.push(4);
            buf.extend_from_slice(&year.to_le_bytes());
            buf.push(*month);
            buf.push(*day);
        }
        Value::DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            micros,
        } => {
            buf.push(11);
            buf.extend_from_slice(&year.to_le_bytes());
            buf.push(*month);
            buf.push(*day);
            buf.push(*hour);
            buf.push(*minute);
            buf.push(*second);
            buf.extend_from_slice(&micros.to_le_bytes());
        }
        Value::Time {
            negative,
            days,
            hours,
            minutes,
            seconds,
            micros,
        } => {
            buf.push(12);
            buf.push(if *negative { 1 } else { 0 });
            buf.extend_from_slice(&days.to_le_bytes());
            buf.push(*hours);
            buf.push(*minutes);
            buf.push(*seconds);
            buf.extend_from_slice(&micros.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn marks_null_in_bitmap() {
        let params = vec![Value::Null, Value::Int(5)];
        let bitmap = null_bitmap(&params);
        assert_eq!(bitmap[0] & 0x01, 0x01);
        assert_eq!(bitmap[0] & 0x02, 0);
    }

    #[test]
    fn skips_long_data_values_when_serializing() {
        let params = vec![Value::Bytes(vec![1, 2, 3])];
        let long_data = vec![true];
        let cmd = StmtExecuteCommand::new(7, 0, &params, &long_data);
        let bytes = cmd.serialize().unwrap();
        // header(1) + stmt_id(4) + flags(1) + iter_count(4) + bitmap(1) + new_params(1) + type(2)
        assert_eq!(bytes.len(), 1 + 4 + 1 + 4 + 1 + 1 + 2);
    }
}
