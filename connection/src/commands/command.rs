/// First byte of every command packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Sleep = 0,
    Quit = 1,
    InitDb = 2,
    Query = 3,
    FieldList = 4,
    Refresh = 7,
    Shutdown = 8,
    Statistics = 9,
    ProcessInfo = 10,
    ProcessKill = 12,
    Debug = 13,
    Ping = 14,
    ChangeUser = 17,
    StmtPrepare = 22,
    StmtExecute = 23,
    StmtSendLongData = 24,
    StmtClose = 25,
    StmtReset = 26,
}
