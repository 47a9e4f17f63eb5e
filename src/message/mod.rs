//! Bolt protocol messages.
//!
//! Messages are PackStream structures whose signature byte identifies the
//! message kind. Each direction has its own signature space: requests travel
//! client-to-server, responses server-to-client. Message shapes vary with
//! the negotiated protocol version, so request encoding always takes the
//! version explicitly.

pub mod request;
pub mod response;
pub mod summary;

pub use request::{
    AccessMode, AuthToken, BeginMessage, DiscardMessage, HelloMessage, LogonMessage, PullMessage,
    Request, RunMessage,
};
pub use response::{FailureMessage, RecordMessage, Response, SuccessMessage};
pub use summary::{
    Notification, NotificationPosition, NotificationSeverity, QueryPlan, QueryProfile, QueryStats,
    QueryType, ResultSummary,
};

/// Message signatures.
pub mod signature {
    /// HELLO (Bolt 3+) and INIT (Bolt 1/2) share a signature
    pub const HELLO: u8 = 0x01;
    /// GOODBYE (Bolt 3+)
    pub const GOODBYE: u8 = 0x02;
    /// ACK_FAILURE (Bolt 1/2)
    pub const ACK_FAILURE: u8 = 0x0E;
    /// RESET
    pub const RESET: u8 = 0x0F;
    /// RUN
    pub const RUN: u8 = 0x10;
    /// BEGIN (Bolt 3+)
    pub const BEGIN: u8 = 0x11;
    /// COMMIT (Bolt 3+)
    pub const COMMIT: u8 = 0x12;
    /// ROLLBACK (Bolt 3+)
    pub const ROLLBACK: u8 = 0x13;
    /// DISCARD; DISCARD_ALL before Bolt 4
    pub const DISCARD: u8 = 0x2F;
    /// PULL; PULL_ALL before Bolt 4
    pub const PULL: u8 = 0x3F;
    /// LOGON (Bolt 5.1+)
    pub const LOGON: u8 = 0x6A;

    /// SUCCESS response
    pub const SUCCESS: u8 = 0x70;
    /// RECORD response
    pub const RECORD: u8 = 0x71;
    /// IGNORED response
    pub const IGNORED: u8 = 0x7E;
    /// FAILURE response
    pub const FAILURE: u8 = 0x7F;
}
