//! A decoded column value, shared by the text and binary row readers.

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    /// Strings, BLOBs, and decimals all arrive as raw bytes; the caller
    /// decides how to interpret them.
    Bytes(Vec<u8>),
    Date {
        year: u16,
        month: u8,
        day: u8,
    },
    Time {
        negative: bool,
        days: u32,
        hours: u8,
        minutes: u8,
        seconds: u8,
        micros: u32,
    },
    DateTime {
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        micros: u32,
    },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

/// A single row: one `Value` per column, in column order.
#[derive(Debug, Clone, Default)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text-protocol rows carry every non-NULL cell as a length-encoded
    /// string; column-type-specific decoding is left to the caller via
    /// [`Value::as_str`].
    pub fn from_text_cells(cells: Vec<Option<String>>) -> Row {
        Row(cells
            .into_iter()
            .map(|cell| match cell {
                Some(s) => Value::Bytes(s.into_bytes()),
                None => Value::Null,
            })
            .collect())
    }
}
