//! Bolt protocol version definitions.

use std::fmt;

/// A Bolt protocol version as a (major, minor) pair.
///
/// The negotiated version gates message shapes and state transitions for
/// the lifetime of a connection, so it is passed explicitly wherever
/// behavior differs between versions.
///
/// On the wire a version occupies four bytes, big-endian, with the minor in
/// the third byte and the major in the fourth: 5.4 is `00 00 04 05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoltVersion {
    /// Major version number
    pub major: u8,
    /// Minor version number
    pub minor: u8,
}

impl BoltVersion {
    /// Bolt 1.0
    pub const V1_0: BoltVersion = BoltVersion::new(1, 0);
    /// Bolt 2.0 - byte arrays
    pub const V2_0: BoltVersion = BoltVersion::new(2, 0);
    /// Bolt 3.0 - HELLO/GOODBYE, explicit transactions
    pub const V3_0: BoltVersion = BoltVersion::new(3, 0);
    /// Bolt 4.0 - reactive PULL/DISCARD with n and qid
    pub const V4_0: BoltVersion = BoltVersion::new(4, 0);
    /// Bolt 4.1 - routing context in HELLO
    pub const V4_1: BoltVersion = BoltVersion::new(4, 1);
    /// Bolt 4.2
    pub const V4_2: BoltVersion = BoltVersion::new(4, 2);
    /// Bolt 4.3 - version range negotiation
    pub const V4_3: BoltVersion = BoltVersion::new(4, 3);
    /// Bolt 4.4 - impersonated user
    pub const V4_4: BoltVersion = BoltVersion::new(4, 4);
    /// Bolt 5.0 - element ids, UTC datetimes
    pub const V5_0: BoltVersion = BoltVersion::new(5, 0);
    /// Bolt 5.1 - LOGON/LOGOFF authentication phase
    pub const V5_1: BoltVersion = BoltVersion::new(5, 1);
    /// Bolt 5.2 - bolt_agent, notification filtering
    pub const V5_2: BoltVersion = BoltVersion::new(5, 2);
    /// Bolt 5.3
    pub const V5_3: BoltVersion = BoltVersion::new(5, 3);
    /// Bolt 5.4 - telemetry
    pub const V5_4: BoltVersion = BoltVersion::new(5, 4);

    /// Newest version this crate speaks.
    pub const LATEST: BoltVersion = BoltVersion::V5_4;

    /// Default handshake candidates, newest first.
    pub const DEFAULT_CANDIDATES: [BoltVersion; 3] =
        [BoltVersion::V5_4, BoltVersion::V4_2, BoltVersion::V3_0];

    /// Create a version from its parts.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Wire encoding: `[0, 0, minor, major]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [0, 0, self.minor, self.major]
    }

    /// Parse the wire encoding. `None` for the all-zero "no version" reply
    /// and for replies carrying unexpected high bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        if bytes[0] != 0 || bytes[1] != 0 {
            return None;
        }
        match (bytes[3], bytes[2]) {
            (0, 0) => None,
            (major, minor) => Some(Self::new(major, minor)),
        }
    }

    /// Messages are HELLO-style (v3+) rather than INIT-style (v1/v2).
    pub fn supports_hello(self) -> bool {
        self.major >= 3
    }

    /// Explicit transactions via BEGIN/COMMIT/ROLLBACK (v3+).
    pub fn supports_explicit_tx(self) -> bool {
        self.major >= 3
    }

    /// Failure recovery uses ACK_FAILURE (v1/v2) instead of RESET alone.
    pub fn uses_ack_failure(self) -> bool {
        self.major < 3
    }

    /// PULL/DISCARD carry `n` and `qid` extras (v4+); earlier versions only
    /// have PULL_ALL/DISCARD_ALL.
    pub fn supports_pull_n(self) -> bool {
        self.major >= 4
    }

    /// Byte array values (v2+).
    pub fn supports_bytes(self) -> bool {
        self.major >= 2
    }

    /// Routing context entry in HELLO (v4.1+).
    pub fn supports_routing_context(self) -> bool {
        self >= BoltVersion::V4_1
    }

    /// Version-range handshake candidates (v4.3+).
    pub fn supports_range_negotiation(self) -> bool {
        self >= BoltVersion::V4_3
    }

    /// Impersonated user in RUN/BEGIN extras (v4.4+).
    pub fn supports_impersonation(self) -> bool {
        self >= BoltVersion::V4_4
    }

    /// Element ids on graph entities and UTC datetime signatures (v5+).
    pub fn uses_utc_datetimes(self) -> bool {
        self.major >= 5
    }

    /// Authentication moved out of HELLO into LOGON (v5.1+).
    pub fn supports_logon(self) -> bool {
        self >= BoltVersion::V5_1
    }

    /// bolt_agent and notification filters in HELLO (v5.2+).
    pub fn supports_notification_filters(self) -> bool {
        self >= BoltVersion::V5_2
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
