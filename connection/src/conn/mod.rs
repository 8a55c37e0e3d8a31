//! Connection-layer modules: transport, session state, the handshake and
//! command dispatch built on top of it, and the connection handle itself.

pub mod connection;
pub mod connection_options;
pub mod cursor;
pub mod dispatcher;
pub mod packet_channel;
pub mod session;
pub mod ssl_mode;
pub mod stmt;

pub use connection::{Connection, OkResult, QueryResult, QueryResultIter};
pub use connection_options::{ConnectionOptions, SslOpts};
pub use cursor::CursorKind;
pub use session::Session;
pub use ssl_mode::SslMode;
pub use stmt::{PreparedStatement, StmtExecuteResult};
