//! The client connection: handshake, authentication, the command surface
//! (`query`/`query_iter`/prepared statements/session commands/transactions),
//! and the bookkeeping that keeps `Session` in sync with what the server
//! reports back.

use openssl::rsa::{Padding, Rsa};
use tracing::instrument;

use common::err::{CResult, MySqlError};

use crate::bytes::xor;
use crate::commands::authenticate_command::AuthenticateCommand;
use crate::commands::change_user_command::ChangeUserCommand;
use crate::commands::query_command::QueryCommand;
use crate::commands::session_commands::{
    DebugCommand, InitDbCommand, PingCommand, ProcessKillCommand, QuitCommand, RefreshCommand,
    ShutdownCommand, StatisticsCommand,
};
use crate::commands::ssl_request_command::SslRequestCommand;
use crate::conn::connection_options::ConnectionOptions;
use crate::conn::cursor::{self, CursorKind};
use crate::conn::dispatcher::{classify_first_packet, handle_local_infile, read_column_defs, PacketKind};
use crate::conn::packet_channel::PacketChannel;
use crate::conn::session::Session;
use crate::conn::ssl_mode::SslMode;
use crate::conn::stmt::{PreparedStatement, StmtExecuteResult};
use crate::declar::auth_plugin_names::AuthPlugin;
use crate::declar::capability_flags::CapabilityFlags;
use crate::declar::{auth_plugin_names, capability_flags};
use crate::packet::check_error_packet;
use crate::packet::handshake_packet::HandshakePacket;
use crate::packet::ok_packet::OkPacket;
use crate::packet::response_type::ResponseType;
use crate::packet::result_set_column_packet::ResultSetColumnPacket;
use crate::value::Row;
use crate::{NULL_TERMINATOR, UTF8_MB4_GENERAL_CI};

/// Outcome of a statement: either a server acknowledgement (`INSERT`,
/// `UPDATE`, DDL, ...) or the header of a result set. The rows behind a
/// `Rows` header are not included here; they stay on the wire until
/// [`Connection::get_rows`]/[`Connection::get_row`] drains them, mirroring
/// `unread_result`'s false->true->false lifecycle.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Ok(OkResult),
    Rows(Vec<ResultSetColumnPacket>),
}

#[derive(Debug, Clone, Default)]
pub struct OkResult {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub warnings: u16,
    pub info: String,
}

impl From<OkPacket> for OkResult {
    fn from(ok: OkPacket) -> Self {
        OkResult {
            affected_rows: ok.affected_rows,
            last_insert_id: ok.last_insert_id,
            warnings: ok.warnings,
            info: ok.info,
        }
    }
}

/// The server's handshake record, fixed once authentication completes:
/// needed later only to re-authenticate via `COM_CHANGE_USER`, which hashes
/// the new password against the *original* scramble rather than a fresh one.
#[derive(Debug, Clone)]
struct HandshakeInfo {
    scramble: String,
    auth_plugin: AuthPlugin,
}

#[derive(Debug)]
pub struct Connection {
    pub options: ConnectionOptions,
    channel: Option<PacketChannel>,
    session: Session,
    handshake: Option<HandshakeInfo>,
    pending_columns: Option<Vec<ResultSetColumnPacket>>,
    pending_binary: bool,
}

impl Connection {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            channel: None,
            session: Session::default(),
            handshake: None,
            pending_columns: None,
            pending_binary: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    fn channel_mut(&mut self) -> CResult<&mut PacketChannel> {
        self.channel
            .as_mut()
            .ok_or_else(|| MySqlError::operational("connection is not open"))
    }

    /// Opens the transport, performs the handshake and authentication, and
    /// applies the post-connection session parameters (`SET NAMES`,
    /// autocommit, `sql_mode`, `time_zone`).
    #[instrument(skip(self))]
    pub fn open(&mut self) -> CResult<()> {
        if self.channel.is_some() {
            return Ok(());
        }

        let mut channel = PacketChannel::new(&self.options)?;
        channel = self.do_handshake(channel)?;

        if self.options.compress && self.session.has_capability(capability_flags::CLIENT_COMPRESS) {
            channel.enable_compression();
        }

        self.channel = Some(channel);

        if let Err(err) = self.finish_open() {
            self.channel = None;
            self.handshake = None;
            self.session.reset_on_disconnect();
            return Err(err);
        }

        Ok(())
    }

    /// The post-handshake steps (`INIT_DB`, session defaults) that can
    /// still fail after the transport is in place. Split out of `open` so
    /// a failure here can roll `self.channel` back to `None` instead of
    /// leaving `is_open()` reporting true on a connection that never
    /// finished opening.
    fn finish_open(&mut self) -> CResult<()> {
        if self.options.database.is_some()
            && !self.session.has_capability(capability_flags::CLIENT_CONNECT_WITH_DB)
        {
            let database = self.options.database.clone().unwrap();
            self.init_db(&database)?;
        }

        self.apply_session_defaults()
    }

    fn apply_session_defaults(&mut self) -> CResult<()> {
        let charset = self.options.charset.clone();
        let collation = self.options.collation.clone();
        self.set_charset_collation(&charset, collation.as_deref())?;

        if self.options.autocommit {
            self.set_autocommit(true)?;
        }
        if let Some(sql_mode) = self.options.sql_mode.clone() {
            self.set_sql_mode(&sql_mode)?;
        }
        if let Some(time_zone) = self.options.time_zone.clone() {
            self.set_time_zone(&time_zone)?;
        }

        Ok(())
    }

    /// Sends `COM_QUIT` and closes the socket. Idempotent, and never fails:
    /// by the time a caller wants to disconnect, a transport error talking
    /// to a server that's already gone isn't worth surfacing.
    pub fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            let _ = channel.write_packet(&QuitCommand.serialize().unwrap_or_default(), 0);
            let _ = channel.close();
        }
        self.session.reset_on_disconnect();
        self.pending_columns = None;
    }

    /// Disconnects (if connected) and retries `open()` up to `attempts`
    /// times, sleeping `delay` between tries. Returns the last error if
    /// every attempt fails.
    pub fn reconnect(&mut self, attempts: u32, delay: std::time::Duration) -> CResult<()> {
        self.disconnect();
        let mut last_err = None;
        for attempt in 0..attempts.max(1) {
            if attempt > 0 {
                std::thread::sleep(delay);
            }
            match self.open() {
                Ok(()) => return Ok(()),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| MySqlError::operational("reconnect attempts exhausted")))
    }

    fn ensure_can_send_command(&self) -> CResult<()> {
        if self.session.unread_result {
            return Err(MySqlError::internal(
                "a result set is still unread; call get_rows()/get_row() first",
            ));
        }
        Ok(())
    }

    fn send_command(&mut self, payload: &[u8]) -> CResult<()> {
        self.ensure_can_send_command()?;
        let channel = self.channel_mut()?;
        channel.write_packet(payload, 0)
    }

    /// Reads and classifies the next result header off the wire. Leaves
    /// `unread_result` set (and `pending_columns`/`pending_binary`
    /// populated) when the header announces a result set; the rows
    /// themselves are read by a later `get_rows`/`get_row` call.
    fn read_result_header(&mut self, binary: bool) -> CResult<QueryResult> {
        let (packet, seq_num) = {
            let channel = self.channel_mut()?;
            channel.read_packet()?
        };

        match classify_first_packet(&packet)? {
            PacketKind::Ok(ok) => {
                self.session.update_from_status(ok.status_flags.bits());
                Ok(QueryResult::Ok(OkResult::from(ok)))
            }
            PacketKind::Eof(eof) => {
                self.session.update_from_status(eof.server_status);
                Ok(QueryResult::Ok(OkResult {
                    warnings: eof.warning_count,
                    ..OkResult::default()
                }))
            }
            PacketKind::LocalInfile(filename) => {
                let ok = {
                    let channel = self.channel_mut()?;
                    handle_local_infile(channel, &filename, seq_num)?
                };
                self.session.update_from_status(ok.status_flags.bits());
                Ok(QueryResult::Ok(OkResult::from(ok)))
            }
            PacketKind::ColumnCount(count) => {
                let columns = {
                    let channel = self.channel_mut()?;
                    read_column_defs(channel, count)?
                };
                self.session.unread_result = true;
                self.pending_columns = Some(columns.clone());
                self.pending_binary = binary;
                Ok(QueryResult::Rows(columns))
            }
        }
    }

    /// Drains whatever result is currently unread, discarding the rows.
    /// Used before issuing `ROLLBACK`/a fresh command when the caller
    /// abandoned a result set without reading it to completion.
    pub fn drain_unread_result(&mut self) -> CResult<()> {
        if !self.session.unread_result {
            return Ok(());
        }
        self.get_rows()?;
        Ok(())
    }

    /// Reads every remaining row of the current result set and clears
    /// `unread_result`. Fails if no result set is currently unread.
    pub fn get_rows(&mut self) -> CResult<Vec<Row>> {
        if !self.session.unread_result {
            return Err(MySqlError::internal("no unread result to read"));
        }
        let columns = self.pending_columns.clone().unwrap_or_default();
        let binary = self.pending_binary;
        let (rows, eof) = {
            let channel = self.channel_mut()?;
            cursor::get_rows(channel, &columns, binary)?
        };
        self.session.update_from_status(eof.server_status);
        self.session.unread_result = false;
        self.pending_columns = None;
        Ok(rows)
    }

    /// Reads a single row, or `None` once the result set is exhausted (at
    /// which point `unread_result` is cleared). Fails if no result set is
    /// currently unread.
    pub fn get_row(&mut self) -> CResult<Option<Row>> {
        if !self.session.unread_result {
            return Err(MySqlError::internal("no unread result to read"));
        }
        let columns = self.pending_columns.clone().unwrap_or_default();
        let binary = self.pending_binary;
        let (row, eof) = {
            let channel = self.channel_mut()?;
            cursor::get_row(channel, &columns, binary)?
        };
        if let Some(eof) = eof {
            self.session.update_from_status(eof.server_status);
            self.session.unread_result = false;
            self.pending_columns = None;
        }
        Ok(row)
    }

    /// Runs a single-result statement. Fails with an `Interface` error
    /// directing the caller to `query_iter` if the statement turns out to
    /// produce more than one result (e.g. a stored procedure call, or a
    /// multi-statement batch sent with `CLIENT_MULTI_STATEMENTS`). In that
    /// failure case the extra results are left unconsumed on the wire; the
    /// connection should be treated as unusable until reconnected.
    pub fn query(&mut self, sql: &str) -> CResult<QueryResult> {
        self.send_command(&QueryCommand::new(sql.to_string()).serialize()?)?;
        let result = self.read_result_header(false)?;
        if self.session.have_next_result {
            return Err(MySqlError::interface(
                "statement produced multiple results; use query_iter instead",
            ));
        }
        Ok(result)
    }

    /// Runs a statement that may produce a chain of results (stored
    /// procedures, `CLIENT_MULTI_STATEMENTS` batches). Each item in the
    /// returned iterator must be fully drained (its rows read, if any)
    /// before the next one can be fetched; dropping the iterator early
    /// drains the rest automatically so the connection is never left with
    /// stray unread data.
    pub fn query_iter<'a>(&'a mut self, sql: &str) -> CResult<QueryResultIter<'a>> {
        self.send_command(&QueryCommand::new(sql.to_string()).serialize()?)?;
        Ok(QueryResultIter {
            conn: self,
            first: true,
            done: false,
        })
    }

    pub fn prepare(&mut self, statement: &str) -> CResult<PreparedStatement> {
        self.ensure_can_send_command()?;
        let channel = self.channel_mut()?;
        PreparedStatement::prepare(channel, statement)
    }

    pub fn execute(
        &mut self,
        stmt: &PreparedStatement,
        params: &[crate::value::Value],
        data: &mut [Option<Box<dyn std::io::Read>>],
    ) -> CResult<QueryResult> {
        self.ensure_can_send_command()?;
        let outcome = {
            let channel = self.channel_mut()?;
            stmt.execute(channel, params, data)?
        };
        match outcome {
            StmtExecuteResult::Ok(ok) => {
                self.session.update_from_status(ok.status_flags.bits());
                Ok(QueryResult::Ok(OkResult::from(ok)))
            }
            StmtExecuteResult::Rows(columns) => {
                self.session.unread_result = true;
                self.pending_binary = true;
                self.pending_columns = Some(columns.clone());
                Ok(QueryResult::Rows(columns))
            }
        }
    }

    pub fn close_stmt(&mut self, stmt: &PreparedStatement) -> CResult<()> {
        let channel = self.channel_mut()?;
        stmt.close(channel)
    }

    pub fn reset_stmt(&mut self, stmt: &PreparedStatement) -> CResult<()> {
        let channel = self.channel_mut()?;
        stmt.reset(channel)
    }

    /// Resolves the requested cursor shape; see [`CursorKind::resolve`] for
    /// why `buffered && prepared` is rejected rather than downgraded.
    pub fn cursor(&self, buffered: bool, raw: bool, prepared: bool) -> CResult<CursorKind> {
        CursorKind::resolve(buffered, raw, prepared)
    }

    fn exec_sql(&mut self, sql: &str) -> CResult<OkResult> {
        self.send_command(&QueryCommand::new(sql.to_string()).serialize()?)?;
        match self.read_result_header(false)? {
            QueryResult::Ok(ok) => Ok(ok),
            QueryResult::Rows(_) => {
                self.drain_unread_result()?;
                Err(MySqlError::interface(
                    "expected an OK response but the server returned a result set",
                ))
            }
        }
    }

    pub fn ping(&mut self) -> CResult<()> {
        self.send_command(&PingCommand.serialize()?)?;
        self.expect_ok("PING error.")
    }

    /// Switches the default database via `COM_INIT_DB`. Used both directly
    /// and as the implementation of [`Connection::set_database`]: a raw
    /// `USE <database>` string would reopen the SQL-injection hazard that
    /// command exists specifically to avoid.
    pub fn init_db(&mut self, schema: &str) -> CResult<()> {
        self.send_command(&InitDbCommand::new(schema.to_string()).serialize()?)?;
        self.expect_ok("INIT_DB error.")?;
        self.session.database = Some(schema.to_string());
        self.options.database = Some(schema.to_string());
        Ok(())
    }

    pub fn refresh(&mut self, subcommand: u8) -> CResult<()> {
        self.send_command(&RefreshCommand::new(subcommand).serialize()?)?;
        self.expect_ok("REFRESH error.")
    }

    pub fn process_kill(&mut self, connection_id: u32) -> CResult<()> {
        self.send_command(&ProcessKillCommand::new(connection_id).serialize()?)?;
        self.expect_ok("KILL error.")
    }

    pub fn debug(&mut self) -> CResult<()> {
        self.send_command(&DebugCommand.serialize()?)?;
        self.expect_ok("DEBUG error.")
    }

    /// `COM_STATISTICS` replies with a bare human-readable string, not an
    /// OK/ERR-tagged packet, so this bypasses the usual dispatcher.
    pub fn statistics(&mut self) -> CResult<String> {
        self.send_command(&StatisticsCommand.serialize()?)?;
        let channel = self.channel_mut()?;
        let (packet, _) = channel.read_packet()?;
        Ok(String::from_utf8_lossy(&packet).into_owned())
    }

    pub fn shutdown(&mut self, shutdown_type: u8) -> CResult<()> {
        self.send_command(&ShutdownCommand::new(shutdown_type).serialize()?)?;
        self.expect_ok("SHUTDOWN error.")
    }

    /// Re-authenticates as a different user over the existing connection
    /// via `COM_CHANGE_USER`, hashing the new password against the
    /// *original* handshake scramble.
    pub fn change_user(
        &mut self,
        username: &str,
        password: &str,
        database: Option<&str>,
    ) -> CResult<()> {
        let handshake = self
            .handshake
            .clone()
            .ok_or_else(|| MySqlError::operational("connection has no recorded handshake"))?;

        let command = ChangeUserCommand::new(
            username.to_string(),
            password.to_string(),
            database.map(str::to_string),
            handshake.scramble,
            self.options.charset_id(),
            handshake.auth_plugin,
        );
        self.send_command(&command.serialize()?)?;
        self.expect_ok("CHANGE_USER error.")?;

        self.options.username = username.to_string();
        self.options.password = password.to_string();
        if let Some(db) = database {
            self.options.database = Some(db.to_string());
            self.session.database = Some(db.to_string());
        }
        Ok(())
    }

    fn expect_ok(&mut self, err_message: &str) -> CResult<()> {
        let channel = self.channel_mut()?;
        let (packet, _) = channel.read_packet()?;
        check_error_packet(&packet, err_message)?;
        if packet[0] == ResponseType::OK {
            let ok = OkPacket::parse(&packet)?;
            self.session.update_from_status(ok.status_flags.bits());
        }
        Ok(())
    }

    pub fn set_charset_collation(&mut self, charset: &str, collation: Option<&str>) -> CResult<()> {
        let sql = match collation {
            Some(collation) => format!("SET NAMES '{charset}' COLLATE '{collation}'"),
            None => format!("SET NAMES '{charset}'"),
        };
        self.exec_sql(&sql)?;
        self.options.charset = charset.to_string();
        self.options.collation = collation.map(str::to_string);
        self.session.character_set = self.options.charset_id();
        Ok(())
    }

    pub fn set_autocommit(&mut self, on: bool) -> CResult<()> {
        self.exec_sql(&format!("SET autocommit={}", u8::from(on)))?;
        self.session.autocommit = on;
        self.options.autocommit = on;
        Ok(())
    }

    pub fn set_sql_mode(&mut self, mode: &str) -> CResult<()> {
        self.exec_sql(&format!("SET sql_mode='{mode}'"))?;
        self.session.sql_mode = Some(mode.to_string());
        self.options.sql_mode = Some(mode.to_string());
        Ok(())
    }

    pub fn set_time_zone(&mut self, time_zone: &str) -> CResult<()> {
        self.exec_sql(&format!("SET @@session.time_zone='{time_zone}'"))?;
        self.session.time_zone = Some(time_zone.to_string());
        self.options.time_zone = Some(time_zone.to_string());
        Ok(())
    }

    /// Switches the default database. Deliberately implemented via
    /// `COM_INIT_DB` rather than a `USE <database>` query string: building
    /// that SQL by formatting a caller-supplied name directly into a
    /// statement is exactly the kind of injection hazard `INIT_DB` exists
    /// to route around.
    pub fn set_database(&mut self, database: &str) -> CResult<()> {
        self.init_db(database)
    }

    pub fn start_transaction(
        &mut self,
        consistent_snapshot: bool,
        isolation_level: Option<&str>,
    ) -> CResult<()> {
        if self.session.in_transaction {
            return Err(MySqlError::programming(
                "a transaction is already in progress",
            ));
        }

        if let Some(level) = isolation_level {
            let normalized = normalize_isolation_level(level)?;
            self.exec_sql(&format!("SET TRANSACTION ISOLATION LEVEL {normalized}"))?;
        }

        let mut sql = String::from("START TRANSACTION");
        if consistent_snapshot {
            sql.push_str(" WITH CONSISTENT SNAPSHOT");
        }
        self.exec_sql(&sql)?;
        self.session.in_transaction = true;
        Ok(())
    }

    pub fn commit(&mut self) -> CResult<()> {
        self.exec_sql("COMMIT")?;
        self.session.in_transaction = false;
        Ok(())
    }

    /// Drains any outstanding unread result before issuing `ROLLBACK`: a
    /// caller that abandons a partially-read result set mid-transaction and
    /// rolls back shouldn't be left with stray rows blocking the next
    /// command.
    pub fn rollback(&mut self) -> CResult<()> {
        self.drain_unread_result()?;
        self.exec_sql("ROLLBACK")?;
        self.session.in_transaction = false;
        Ok(())
    }

    pub fn server_version(&self) -> &str {
        &self.session.server_version
    }

    pub fn connection_id(&self) -> u32 {
        self.session.connection_id
    }

    pub fn charset(&self) -> &str {
        &self.options.charset
    }

    pub fn collation(&self) -> Option<&str> {
        self.options.collation.as_deref()
    }

    pub fn in_transaction(&self) -> bool {
        self.session.in_transaction
    }

    pub fn database(&self) -> Option<&str> {
        self.session.database.as_deref()
    }

    pub fn autocommit(&self) -> bool {
        self.session.autocommit
    }

    pub fn sql_mode(&self) -> Option<&str> {
        self.session.sql_mode.as_deref()
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.session.time_zone.as_deref()
    }

    pub fn user(&self) -> &str {
        &self.options.username
    }

    pub fn server_host(&self) -> &str {
        &self.options.hostname
    }

    pub fn server_port(&self) -> u16 {
        self.options.port
    }

    pub fn unix_socket(&self) -> Option<&str> {
        self.options.unix_socket.as_deref()
    }

    pub fn client_flags(&self) -> u64 {
        self.session.capability_flags.bits()
    }

    pub fn unread_result(&self) -> bool {
        self.session.unread_result
    }

    pub fn get_warnings(&self) -> bool {
        self.options.get_warnings
    }

    pub fn raise_on_warnings(&self) -> bool {
        self.options.raise_on_warnings
    }

    /// Performs the handshake and authentication. SSL, if requested,
    /// upgrades `channel` mid-flow, which is why this returns the
    /// (possibly replaced) channel rather than mutating in place.
    fn do_handshake(&mut self, mut channel: PacketChannel) -> CResult<PacketChannel> {
        let (packet, seq_num) = channel.read_packet()?;
        check_error_packet(&packet, "Initial handshake error.")?;
        let handshake = HandshakePacket::parse(&packet)?;

        let mut seq_num = seq_num;
        if handshake.protocol_version != 10u8 {
            return Err(MySqlError::interface(format!(
                "unsupported protocol version {}",
                handshake.protocol_version
            )));
        }
        let (major, minor, _) = handshake.server_version_tuple;
        if (major, minor) < (4, 1) {
            return Err(MySqlError::interface(format!(
                "server version {} predates MySQL 4.1, which is unsupported",
                handshake.server_version
            )));
        }

        let server_capabilities = CapabilityFlags::new(handshake.server_capabilities);
        if !server_capabilities.contains(capability_flags::CLIENT_PROTOCOL_41) {
            return Err(MySqlError::interface(
                "server does not support CLIENT_PROTOCOL_41",
            ));
        }

        self.record_handshake(&handshake);

        if self.options.ssl_mode != SslMode::Disabled {
            let ssl_available = server_capabilities.contains(capability_flags::CLIENT_SSL);
            if !ssl_available && self.options.ssl_mode >= SslMode::Require {
                return Err(MySqlError::operational(
                    "the server does not support SSL encryption",
                ));
            }
            if ssl_available {
                let ssl_command = SslRequestCommand::new(UTF8_MB4_GENERAL_CI);
                seq_num += 1;
                channel.write_packet(&ssl_command.serialize()?, seq_num)?;
                channel = channel.upgrade_to_ssl(&self.options)?;
            }
        }

        let auth_plugin = get_auth_plugin(&handshake.auth_plugin_name)?;
        self.handshake = Some(HandshakeInfo {
            scramble: handshake.scramble.clone(),
            auth_plugin,
        });

        let auth_command =
            AuthenticateCommand::new(&self.options, &handshake, auth_plugin, UTF8_MB4_GENERAL_CI);
        seq_num += 1;
        channel.write_packet(&auth_command.serialize()?, seq_num)?;

        let (packet, seq_num) = channel.read_packet()?;
        check_error_packet(&packet, "Authentication error.")?;
        match packet[0] {
            ResponseType::OK => Ok(channel),
            ResponseType::OLD_PASSWORD => Err(MySqlError::not_supported(
                "old insecure passwords are not supported",
            )),
            _ => {
                authenticate_sha_256(
                    &mut channel,
                    &packet,
                    &handshake.scramble,
                    &self.options.password,
                    seq_num + 1,
                )?;
                Ok(channel)
            }
        }
    }

    fn record_handshake(&mut self, handshake: &HandshakePacket) {
        self.session.capability_flags =
            CapabilityFlags::new(handshake.server_capabilities & get_client_flags());
        self.session.update_from_status(handshake.status_flags);
        self.session.connection_id = handshake.connection_id;
        self.session.character_set = handshake.server_collation;
        self.session.server_version = handshake.server_version.clone();
    }
}

/// Iterator over a multi-result statement's results. Drops drain whatever
/// is left unread, mirroring the teacher's stream-result idiom: a caller
/// that stops iterating early must not leave the socket holding rows meant
/// for a later, unrelated command.
pub struct QueryResultIter<'a> {
    conn: &'a mut Connection,
    first: bool,
    done: bool,
}

impl Iterator for QueryResultIter<'_> {
    type Item = CResult<QueryResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.first {
            if self.conn.session.unread_result {
                if let Err(err) = self.conn.drain_unread_result() {
                    self.done = true;
                    return Some(Err(err));
                }
            }
            if !self.conn.session.have_next_result {
                self.done = true;
                return None;
            }
        }
        self.first = false;

        match self.conn.read_result_header(false) {
            Ok(result) => Some(Ok(result)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl Drop for QueryResultIter<'_> {
    fn drop(&mut self) {
        while self.next().is_some() {}
    }
}

/// `caching_sha2_password`'s second round trip: a plaintext fast-path over
/// SSL, or an RSA-encrypted password otherwise, requested from the server
/// with a `[0x02]` probe packet if no public key has been cached yet.
/// See https://dev.mysql.com/doc/dev/mysql-server/latest/page_caching_sha2_authentication_exchanges.html
fn authenticate_sha_256(
    channel: &mut PacketChannel,
    packet: &[u8],
    scramble: &str,
    password: &str,
    seq_num: u8,
) -> CResult<()> {
    if packet.len() >= 2 && packet[0] == 0x01 && packet[1] == 0x03 {
        return Ok(());
    }

    let mut password_bytes = password.as_bytes().to_vec();
    password_bytes.push(NULL_TERMINATOR);

    if channel.is_ssl() {
        channel.write_packet(&password_bytes, seq_num)?;
        let (packet, _) = channel.read_packet()?;
        check_error_packet(&packet, "Sending clear password error.")?;
        return Ok(());
    }

    channel.write_packet(&[0x02], seq_num)?;
    let (packet, seq_num) = channel.read_packet()?;
    check_error_packet(&packet, "Requesting caching_sha2_password public key error.")?;

    let public_key = &packet[1..];
    let encrypted_password = xor(&password_bytes, scramble.as_bytes());

    let rsa = Rsa::public_key_from_pem(public_key)
        .map_err(|err| MySqlError::operational(format!("could not parse RSA public key: {err}")))?;
    let mut encrypted_body = vec![0u8; rsa.size() as usize];
    rsa.public_encrypt(&encrypted_password, &mut encrypted_body, Padding::PKCS1_OAEP)
        .map_err(|err| MySqlError::operational(format!("RSA encryption failed: {err}")))?;

    channel.write_packet(&encrypted_body, seq_num + 1)?;

    let (packet, _) = channel.read_packet()?;
    check_error_packet(&packet, "Authentication error.")?;
    Ok(())
}

fn get_auth_plugin(auth_plugin_name: &str) -> CResult<AuthPlugin> {
    match auth_plugin_name {
        auth_plugin_names::MY_SQL_NATIVE_PASSWORD => Ok(AuthPlugin::MySqlNativePassword),
        auth_plugin_names::CACHING_SHA2_PASSWORD => Ok(AuthPlugin::CachingSha2Password),
        other => Err(MySqlError::not_supported(format!(
            "{other} auth plugin is not supported"
        ))),
    }
}

fn get_client_flags() -> u64 {
    capability_flags::CLIENT_PROTOCOL_41
        | capability_flags::CLIENT_SECURE_CONNECTION
        | capability_flags::CLIENT_LONG_PASSWORD
        | capability_flags::CLIENT_TRANSACTIONS
        | capability_flags::CLIENT_LOCAL_FILES
        | capability_flags::CLIENT_MULTI_STATEMENTS
        | capability_flags::CLIENT_MULTI_RESULTS
        | capability_flags::CLIENT_PS_MULTI_RESULTS
        | capability_flags::CLIENT_PLUGIN_AUTH
        | capability_flags::CLIENT_LONG_FLAG
        | capability_flags::CLIENT_COMPRESS
}

fn normalize_isolation_level(level: &str) -> CResult<&'static str> {
    match level.to_uppercase().replace('-', " ").as_str() {
        "READ UNCOMMITTED" => Ok("READ UNCOMMITTED"),
        "READ COMMITTED" => Ok("READ COMMITTED"),
        "REPEATABLE READ" => Ok("REPEATABLE READ"),
        "SERIALIZABLE" => Ok("SERIALIZABLE"),
        other => Err(MySqlError::programming(format!(
            "invalid transaction isolation level: {other}"
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_double_start_transaction() {
        let mut conn = Connection::new(ConnectionOptions::default());
        conn.session.in_transaction = true;
        assert!(conn.start_transaction(false, None).is_err());
    }

    #[test]
    fn normalizes_isolation_level_spelling() {
        assert_eq!(
            normalize_isolation_level("repeatable-read").unwrap(),
            "REPEATABLE READ"
        );
        assert!(normalize_isolation_level("bogus").is_err());
    }

    #[test]
    fn unopened_connection_rejects_commands() {
        let mut conn = Connection::new(ConnectionOptions::default());
        assert!(conn.ping().is_err());
    }
}
