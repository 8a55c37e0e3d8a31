//! Row-reading primitives layered over the dispatcher: `get_rows`/`get_row`
//! plus the `buffered`/`raw`/`prepared` cursor-kind resolution a higher-level
//! embedder uses to pick how a result set is drained. The cursor objects
//! DB-API style callers build on top (translating `execute`/`fetch` calls
//! into the commands below) are not this crate's concern; this module stops
//! at handing back decoded [`Row`] values.

use common::err::{CResult, MySqlError};

use crate::conn::dispatcher::{read_binary_rows, read_one_binary_row, read_one_text_row, read_text_rows, RowOrEof};
use crate::conn::packet_channel::PacketChannel;
use crate::packet::end_of_file_packet::EndOfFilePacket;
use crate::packet::result_set_column_packet::ResultSetColumnPacket;
use crate::value::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    BufferedText,
    UnbufferedText,
    BufferedRaw,
    UnbufferedRaw,
}

impl CursorKind {
    /// `buffered=true` together with `prepared=true` is rejected outright
    /// rather than silently downgraded to unbuffered: a caller that asked
    /// for buffering and got streaming instead would see rows vanish out
    /// from under a later `get_rows()` call if it assumed the whole result
    /// was already in memory.
    pub fn resolve(buffered: bool, raw: bool, prepared: bool) -> CResult<CursorKind> {
        if buffered && prepared {
            return Err(MySqlError::programming(
                "buffered cursors are not supported for prepared statements",
            ));
        }
        Ok(match (buffered, raw) {
            (true, true) => CursorKind::BufferedRaw,
            (true, false) => CursorKind::BufferedText,
            (false, true) => CursorKind::UnbufferedRaw,
            (false, false) => CursorKind::UnbufferedText,
        })
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, CursorKind::BufferedText | CursorKind::BufferedRaw)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, CursorKind::BufferedRaw | CursorKind::UnbufferedRaw)
    }
}

/// Reads every remaining row of the current result set in one shot.
/// `unread_result` must be true before this is called; callers check and
/// clear that flag themselves since it lives on the connection's session,
/// not here.
pub fn get_rows(
    channel: &mut PacketChannel,
    columns: &[ResultSetColumnPacket],
    binary: bool,
) -> CResult<(Vec<Row>, EndOfFilePacket)> {
    if binary {
        read_binary_rows(channel, columns)
    } else {
        read_text_rows(channel)
    }
}

/// Reads a single row off the wire, or `None` once the terminating EOF is
/// hit. Returns the EOF alongside so the caller can fold its status flags
/// into the session before clearing `unread_result`.
pub fn get_row(
    channel: &mut PacketChannel,
    columns: &[ResultSetColumnPacket],
    binary: bool,
) -> CResult<(Option<Row>, Option<EndOfFilePacket>)> {
    let outcome = if binary {
        read_one_binary_row(channel, columns)?
    } else {
        read_one_text_row(channel)?
    };
    match outcome {
        RowOrEof::Row(row) => Ok((Some(row), None)),
        RowOrEof::Eof(eof) => Ok((None, Some(eof))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_buffered_prepared_combination() {
        let result = CursorKind::resolve(true, false, true);
        assert!(result.is_err());
    }

    #[test]
    fn resolves_plain_cursor_kinds() {
        assert_eq!(
            CursorKind::resolve(true, false, false).unwrap(),
            CursorKind::BufferedText
        );
        assert_eq!(
            CursorKind::resolve(false, true, true).unwrap(),
            CursorKind::UnbufferedRaw
        );
    }
}
