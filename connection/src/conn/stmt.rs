//! Prepared-statement handle: `STMT_PREPARE` metadata plus the
//! `STMT_EXECUTE`/`STMT_CLOSE`/`STMT_RESET` lifecycle built on top of it.

use std::io::Read;

use common::err::{CResult, MySqlError};

use crate::commands::stmt_close_command::StmtCloseCommand;
use crate::commands::stmt_execute_command::StmtExecuteCommand;
use crate::commands::stmt_prepare_command::StmtPrepareCommand;
use crate::commands::stmt_reset_command::StmtResetCommand;
use crate::commands::stmt_send_long_data_command::StmtSendLongDataCommand;
use crate::conn::dispatcher::{classify_first_packet, read_column_defs, PacketKind};
use crate::conn::packet_channel::PacketChannel;
use crate::packet::check_error_packet;
use crate::packet::ok_packet::OkPacket;
use crate::packet::prepare_ok_packet::PrepareOkPacket;
use crate::packet::result_set_column_packet::ResultSetColumnPacket;
use crate::value::Value;
use crate::LONG_DATA_CHUNK_SIZE;

/// Outcome of `STMT_EXECUTE`'s header, dispatched through the same
/// tag-based table as a text query: an `INSERT`/`UPDATE`/`DELETE` yields an
/// OK record, a `SELECT` yields a fresh (possibly re-negotiated) column
/// set. Rows themselves are drained afterward, the same way a text query's
/// rows are (see `conn::cursor`), not returned here.
pub enum StmtExecuteResult {
    Ok(OkPacket),
    Rows(Vec<ResultSetColumnPacket>),
}

/// A prepared statement's metadata, as returned by `STMT_PREPARE`: an
/// opaque id the server uses to identify it on every later command, plus
/// the parameter and result column definitions (empty vecs when the
/// statement takes no parameters or returns no rows).
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub statement_id: u32,
    pub num_params: u16,
    pub num_columns: u16,
    pub parameter_columns: Vec<ResultSetColumnPacket>,
    pub result_columns: Vec<ResultSetColumnPacket>,
}

impl PreparedStatement {
    pub fn prepare(channel: &mut PacketChannel, statement: &str) -> CResult<PreparedStatement> {
        let command = StmtPrepareCommand::new(statement.to_string());
        channel.write_packet(&command.serialize()?, 0)?;

        let (packet, _) = channel.read_packet()?;
        check_error_packet(&packet, "STMT_PREPARE error.")?;
        let ok = PrepareOkPacket::parse(&packet)?;

        let parameter_columns = if ok.num_params > 0 {
            read_column_defs(channel, ok.num_params as u64)?
        } else {
            Vec::new()
        };

        let result_columns = if ok.num_columns > 0 {
            read_column_defs(channel, ok.num_columns as u64)?
        } else {
            Vec::new()
        };

        Ok(PreparedStatement {
            statement_id: ok.statement_id,
            num_params: ok.num_params,
            num_columns: ok.num_columns,
            parameter_columns,
            result_columns,
        })
    }

    /// Sends `STMT_EXECUTE` with the given bound parameters and returns its
    /// header. `data` is an optional parallel row of readable streams: for
    /// every index where `data[i]` is `Some`, its bytes are read and sent
    /// ahead of `STMT_EXECUTE` via `STMT_SEND_LONG_DATA` in
    /// [`LONG_DATA_CHUNK_SIZE`]-byte chunks, and that parameter is omitted
    /// from the inline value list (only its type tag is still sent, taken
    /// from `params[i]`). This is the caller's opt-in to streaming a large
    /// value straight off a reader rather than having to buffer the whole
    /// thing into a `Value::Bytes` first.
    ///
    /// The column set a `SELECT` returns here is read fresh off the wire
    /// rather than reused from `result_columns`: the server is free to
    /// re-describe the result (e.g. after a view's underlying table
    /// changed) on every execution.
    pub fn execute(
        &self,
        channel: &mut PacketChannel,
        params: &[Value],
        data: &mut [Option<Box<dyn Read>>],
    ) -> CResult<StmtExecuteResult> {
        if data.len() > params.len() {
            return Err(MySqlError::interface(
                "execute() was given more streamable data entries than parameters",
            ));
        }

        let mut long_data_used = vec![false; params.len()];

        for (index, reader) in data.iter_mut().enumerate() {
            let Some(reader) = reader else { continue };
            long_data_used[index] = true;
            let mut chunk = vec![0u8; LONG_DATA_CHUNK_SIZE];
            loop {
                let n = reader.read(&mut chunk)?;
                if n == 0 {
                    break;
                }
                let command =
                    StmtSendLongDataCommand::new(self.statement_id, index as u16, &chunk[..n]);
                channel.write_packet(&command.serialize()?, 0)?;
            }
        }

        let command = StmtExecuteCommand::new(self.statement_id, 0, params, &long_data_used);
        channel.write_packet(&command.serialize()?, 0)?;

        let (packet, _) = channel.read_packet()?;
        match classify_first_packet(&packet)? {
            PacketKind::Ok(ok) => Ok(StmtExecuteResult::Ok(ok)),
            PacketKind::ColumnCount(count) => {
                let columns = read_column_defs(channel, count)?;
                Ok(StmtExecuteResult::Rows(columns))
            }
            _ => Err(MySqlError::interface(
                "unexpected packet tag following STMT_EXECUTE",
            )),
        }
    }

    pub fn close(&self, channel: &mut PacketChannel) -> CResult<()> {
        let command = StmtCloseCommand::new(self.statement_id);
        channel.write_packet(&command.serialize()?, 0)
    }

    pub fn reset(&self, channel: &mut PacketChannel) -> CResult<()> {
        let command = StmtResetCommand::new(self.statement_id);
        channel.write_packet(&command.serialize()?, 0)?;
        let (packet, _) = channel.read_packet()?;
        check_error_packet(&packet, "STMT_RESET error.")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    /// Marks an index long-data-used only when the caller actually supplied
    /// a stream for it, regardless of how large the materialized `Value`
    /// alongside it is.
    #[test]
    fn long_data_flags_follow_caller_supplied_streams_not_value_size() {
        let params = vec![Value::Int(1), Value::Bytes(vec![0u8; 4])];
        let mut data: Vec<Option<Box<dyn Read>>> =
            vec![None, Some(Box::new(Cursor::new(vec![0u8; LONG_DATA_CHUNK_SIZE + 1])))];

        let mut long_data_used = vec![false; params.len()];
        for (index, reader) in data.iter_mut().enumerate() {
            let Some(reader) = reader else { continue };
            long_data_used[index] = true;
            let mut chunk = vec![0u8; LONG_DATA_CHUNK_SIZE];
            let mut chunk_count = 0;
            loop {
                let n = reader.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                chunk_count += 1;
            }
            assert_eq!(chunk_count, 2);
        }

        assert_eq!(long_data_used, vec![false, true]);
    }

    #[test]
    fn no_data_entries_means_no_long_data_used() {
        let params = vec![Value::Int(1), Value::Bytes(vec![0u8; LONG_DATA_CHUNK_SIZE + 1])];
        let mut data: Vec<Option<Box<dyn Read>>> = Vec::new();

        let mut long_data_used = vec![false; params.len()];
        for (index, reader) in data.iter_mut().enumerate() {
            let Some(_reader) = reader else { continue };
            long_data_used[index] = true;
        }

        assert_eq!(long_data_used, vec![false, false]);
    }
}
