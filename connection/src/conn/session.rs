use crate::declar::capability_flags::CapabilityFlags;
use crate::declar::status_flags::StatusFlags;
use crate::declar::status_flags;

/// Everything the connection tracks about the conversation with the server
/// that isn't the socket itself: negotiated capabilities, server identity,
/// and the small bits of client-side bookkeeping (`unread_result`,
/// `have_next_result`, `in_transaction`) that gate which commands are legal
/// to send next.
#[derive(Debug, Clone)]
pub struct Session {
    pub capability_flags: CapabilityFlags,
    pub status_flags: StatusFlags,
    pub connection_id: u32,
    pub character_set: u8,
    pub server_version: String,

    pub database: Option<String>,
    pub autocommit: bool,
    pub sql_mode: Option<String>,
    pub time_zone: Option<String>,

    pub in_transaction: bool,
    pub have_next_result: bool,
    pub unread_result: bool,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            capability_flags: CapabilityFlags::empty(),
            status_flags: StatusFlags::empty(),
            connection_id: 0,
            character_set: 0,
            server_version: String::default(),
            database: None,
            autocommit: false,
            sql_mode: None,
            time_zone: None,
            in_transaction: false,
            have_next_result: false,
            unread_result: false,
        }
    }
}

impl Session {
    pub fn more_results_exists(&self) -> bool {
        self.status_flags
            .contains(status_flags::SERVER_MORE_RESULTS_EXISTS)
    }

    pub fn has_capability(&self, capability_flag: u64) -> bool {
        self.capability_flags.contains(capability_flag)
    }

    pub fn update_from_status(&mut self, status_flags: u16) {
        self.status_flags = StatusFlags::new(status_flags);
        self.in_transaction = self
            .status_flags
            .contains(status_flags::SERVER_STATUS_IN_TRANS);
        self.have_next_result = self.more_results_exists();
    }

    /// Called whenever the connection drops: the server-side session state
    /// (transactions, status flags) is gone, so the client-side mirror must
    /// be cleared too.
    pub fn reset_on_disconnect(&mut self) {
        self.status_flags = StatusFlags::empty();
        self.in_transaction = false;
        self.have_next_result = false;
        self.unread_result = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::declar::status_flags::SERVER_STATUS_IN_TRANS;

    #[test]
    fn update_from_status_tracks_transaction_flag() {
        let mut session = Session::default();
        session.update_from_status(SERVER_STATUS_IN_TRANS as u16);
        assert!(session.in_transaction);
    }

    #[test]
    fn reset_on_disconnect_clears_unread_result() {
        let mut session = Session::default();
        session.unread_result = true;
        session.reset_on_disconnect();
        assert!(!session.unread_result);
    }
}
