//! The versioned protocol state machine.
//!
//! Connection state is plain data: an enum plus a small record of what the
//! server has told us (negotiated version, server info, the open stream's
//! qid). Every message submission asserts its precondition against the
//! current state before anything touches the socket, and every server
//! response computes the next state. Both operations are pure, so the whole
//! table is testable without I/O.

use crate::error::{BoltError, BoltResult};
use crate::handshake::BoltVersion;
use crate::message::response::SuccessMessage;
use crate::message::Request;

/// Protocol states of one logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport established
    Disconnected,
    /// Handshake completed, HELLO/INIT not yet sent
    Negotiated,
    /// HELLO accepted, LOGON still required (Bolt 5.1+)
    Unauthenticated,
    /// Idle and able to accept work
    Ready,
    /// An autocommit result stream is open
    Streaming,
    /// Inside an explicit transaction, no stream open
    TxReady,
    /// Inside an explicit transaction with a stream open
    TxStreaming,
    /// A FAILURE arrived; only RESET (or ACK_FAILURE pre-3.0) recovers
    Failed,
    /// Requests were IGNORED while failed
    Interrupted,
    /// Transport error; terminal
    Defunct,
}

/// Which request a response is answering. Used to pick the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// HELLO or INIT
    Hello,
    /// LOGON
    Logon,
    /// RUN
    Run,
    /// PULL
    Pull,
    /// DISCARD
    Discard,
    /// BEGIN
    Begin,
    /// COMMIT
    Commit,
    /// ROLLBACK
    Rollback,
    /// RESET
    Reset,
    /// ACK_FAILURE
    AckFailure,
}

impl From<&Request> for RequestKind {
    fn from(request: &Request) -> Self {
        match request {
            Request::Hello(_) => RequestKind::Hello,
            Request::Logon(_) => RequestKind::Logon,
            Request::Run(_) => RequestKind::Run,
            Request::Pull(_) => RequestKind::Pull,
            Request::Discard(_) => RequestKind::Discard,
            Request::Begin(_) => RequestKind::Begin,
            Request::Commit => RequestKind::Commit,
            Request::Rollback => RequestKind::Rollback,
            Request::Reset => RequestKind::Reset,
            Request::AckFailure => RequestKind::AckFailure,
            // GOODBYE has no response; treat like RESET for table purposes
            Request::Goodbye => RequestKind::Reset,
        }
    }
}

/// State record for one connection.
#[derive(Debug, Clone)]
pub struct ProtocolState {
    state: ConnectionState,
    version: BoltVersion,
    /// qid of the open stream; -1 when the server did not assign one
    qid: Option<i64>,
    server_agent: Option<String>,
    connection_id: Option<String>,
}

impl ProtocolState {
    /// State immediately after a successful handshake.
    pub fn negotiated(version: BoltVersion) -> Self {
        Self {
            state: ConnectionState::Negotiated,
            version,
            qid: None,
            server_agent: None,
            connection_id: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.version
    }

    /// qid of the open stream, if one is open.
    pub fn qid(&self) -> Option<i64> {
        self.qid
    }

    /// Server agent string, once HELLO has succeeded.
    pub fn server_agent(&self) -> Option<&str> {
        self.server_agent.as_deref()
    }

    /// Server-assigned connection id, once HELLO has succeeded.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Whether the connection is inside an explicit transaction.
    pub fn in_transaction(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::TxReady | ConnectionState::TxStreaming
        )
    }

    /// Whether the connection can never be used again.
    pub fn is_defunct(&self) -> bool {
        self.state == ConnectionState::Defunct
    }

    /// Assert that `request` may be sent in the current state.
    ///
    /// Pairs outside the transition table are rejected here, before any
    /// bytes reach the socket. In the failed states everything is sendable:
    /// the server answers IGNORED for all but the recovery messages.
    pub fn permits_send(&self, request: &Request) -> BoltResult<()> {
        use ConnectionState::*;
        let kind = RequestKind::from(request);
        let allowed = match self.state {
            Disconnected | Defunct => false,
            Negotiated => matches!(kind, RequestKind::Hello),
            Unauthenticated => matches!(kind, RequestKind::Logon | RequestKind::Reset),
            Ready => matches!(
                kind,
                RequestKind::Run | RequestKind::Begin | RequestKind::Reset
            ),
            Streaming | TxStreaming => matches!(
                kind,
                RequestKind::Pull | RequestKind::Discard | RequestKind::Reset
            ),
            TxReady => matches!(
                kind,
                RequestKind::Run
                    | RequestKind::Commit
                    | RequestKind::Rollback
                    | RequestKind::Reset
            ),
            Failed | Interrupted => true,
        };
        // GOODBYE is a valid farewell from any live state.
        let allowed = allowed
            || (matches!(request, Request::Goodbye)
                && !matches!(self.state, Disconnected | Defunct));
        if allowed {
            Ok(())
        } else {
            Err(BoltError::protocol(format!(
                "{} is not a legal message in state {:?}",
                request.name(),
                self.state
            )))
        }
    }

    /// Apply a SUCCESS response to the state.
    pub fn on_success(&mut self, kind: RequestKind, success: &SuccessMessage) {
        use ConnectionState::*;
        match kind {
            RequestKind::Hello => {
                self.server_agent = success.server().map(str::to_string);
                self.connection_id = success.connection_id().map(str::to_string);
                self.state = if self.version.supports_logon() {
                    Unauthenticated
                } else {
                    Ready
                };
            }
            RequestKind::Logon => {
                self.state = Ready;
            }
            RequestKind::Run => {
                self.qid = Some(success.qid().unwrap_or(-1));
                self.state = if self.state == TxReady {
                    TxStreaming
                } else {
                    Streaming
                };
            }
            RequestKind::Pull | RequestKind::Discard => {
                if !success.has_more() {
                    self.qid = None;
                    self.state = if self.state == TxStreaming {
                        TxReady
                    } else {
                        Ready
                    };
                }
            }
            RequestKind::Begin => {
                self.state = TxReady;
            }
            RequestKind::Commit | RequestKind::Rollback => {
                self.state = Ready;
            }
            RequestKind::Reset | RequestKind::AckFailure => {
                // Drops any open stream or transaction along with the failure.
                self.qid = None;
                self.state = Ready;
            }
        }
    }

    /// Apply a FAILURE response: pending work is gone, recovery required.
    pub fn on_failure(&mut self) {
        self.qid = None;
        self.state = ConnectionState::Failed;
    }

    /// Apply an IGNORED response.
    ///
    /// Legal only while failed; anywhere else it is a protocol violation.
    pub fn on_ignored(&mut self) -> BoltResult<()> {
        match self.state {
            ConnectionState::Failed => {
                self.state = ConnectionState::Interrupted;
                Ok(())
            }
            ConnectionState::Interrupted => Ok(()),
            other => Err(BoltError::protocol(format!(
                "IGNORED received in state {:?}",
                other
            ))),
        }
    }

    /// A transport error is terminal.
    pub fn on_transport_error(&mut self) {
        self.qid = None;
        self.state = ConnectionState::Defunct;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::request::{
        BeginMessage, DiscardMessage, HelloMessage, LogonMessage, PullMessage, RunMessage,
    };
    use crate::message::signature;
    use crate::packstream::{Structure, Value};
    use std::collections::HashMap;

    fn success(entries: &[(&str, Value)]) -> SuccessMessage {
        let map: HashMap<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        SuccessMessage::from_structure(Structure::new(
            signature::SUCCESS,
            vec![Value::Map(map)],
        ))
        .unwrap()
    }

    fn hello() -> Request {
        Request::Hello(HelloMessage::new("test"))
    }

    fn run() -> Request {
        Request::Run(RunMessage::new("RETURN 1"))
    }

    fn pull() -> Request {
        Request::Pull(PullMessage::all())
    }

    fn ready_state(version: BoltVersion) -> ProtocolState {
        let mut p = ProtocolState::negotiated(version);
        p.on_success(RequestKind::Hello, &success(&[]));
        if version.supports_logon() {
            p.on_success(RequestKind::Logon, &success(&[]));
        }
        p
    }

    #[test]
    fn test_negotiated_permits_only_hello() {
        let p = ProtocolState::negotiated(BoltVersion::V4_4);
        assert!(p.permits_send(&hello()).is_ok());
        assert!(p.permits_send(&run()).is_err());
        assert!(p.permits_send(&pull()).is_err());
        assert!(p.permits_send(&Request::Reset).is_err());
    }

    #[test]
    fn test_hello_to_ready_pre_5_1() {
        let mut p = ProtocolState::negotiated(BoltVersion::V5_0);
        p.on_success(
            RequestKind::Hello,
            &success(&[
                ("server", Value::from("Neo4j/5.0.0")),
                ("connection_id", Value::from("bolt-9")),
            ]),
        );
        assert_eq!(p.state(), ConnectionState::Ready);
        assert_eq!(p.server_agent(), Some("Neo4j/5.0.0"));
        assert_eq!(p.connection_id(), Some("bolt-9"));
    }

    #[test]
    fn test_hello_to_unauthenticated_on_5_1() {
        let mut p = ProtocolState::negotiated(BoltVersion::V5_1);
        p.on_success(RequestKind::Hello, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Unauthenticated);

        assert!(p
            .permits_send(&Request::Logon(LogonMessage::new(
                crate::message::AuthToken::none()
            )))
            .is_ok());
        assert!(p.permits_send(&run()).is_err());

        p.on_success(RequestKind::Logon, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Ready);
    }

    #[test]
    fn test_autocommit_stream_cycle() {
        let mut p = ready_state(BoltVersion::V4_4);
        assert!(p.permits_send(&run()).is_ok());

        p.on_success(RequestKind::Run, &success(&[("qid", Value::Integer(0))]));
        assert_eq!(p.state(), ConnectionState::Streaming);
        assert_eq!(p.qid(), Some(0));
        assert!(p.permits_send(&run()).is_err());
        assert!(p.permits_send(&pull()).is_ok());

        // batch with more to come
        p.on_success(RequestKind::Pull, &success(&[("has_more", Value::Boolean(true))]));
        assert_eq!(p.state(), ConnectionState::Streaming);
        assert_eq!(p.qid(), Some(0));

        // terminal batch
        p.on_success(RequestKind::Pull, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Ready);
        assert_eq!(p.qid(), None);
    }

    #[test]
    fn test_run_without_qid_tracks_minus_one() {
        let mut p = ready_state(BoltVersion::V3_0);
        p.on_success(RequestKind::Run, &success(&[]));
        assert_eq!(p.qid(), Some(-1));
    }

    #[test]
    fn test_discard_closes_stream() {
        let mut p = ready_state(BoltVersion::V4_4);
        p.on_success(RequestKind::Run, &success(&[("qid", Value::Integer(2))]));
        assert!(p
            .permits_send(&Request::Discard(DiscardMessage::all()))
            .is_ok());
        p.on_success(RequestKind::Discard, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Ready);
    }

    #[test]
    fn test_transaction_cycle() {
        let mut p = ready_state(BoltVersion::V4_4);
        assert!(p.permits_send(&Request::Begin(BeginMessage::new())).is_ok());

        p.on_success(RequestKind::Begin, &success(&[]));
        assert_eq!(p.state(), ConnectionState::TxReady);
        assert!(p.in_transaction());
        assert!(p.permits_send(&Request::Commit).is_ok());
        assert!(p.permits_send(&run()).is_ok());
        assert!(p.permits_send(&pull()).is_err());

        p.on_success(RequestKind::Run, &success(&[("qid", Value::Integer(1))]));
        assert_eq!(p.state(), ConnectionState::TxStreaming);
        assert!(p.permits_send(&Request::Commit).is_err());

        p.on_success(RequestKind::Pull, &success(&[]));
        assert_eq!(p.state(), ConnectionState::TxReady);

        p.on_success(RequestKind::Commit, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Ready);
        assert!(!p.in_transaction());
    }

    #[test]
    fn test_failure_and_reset_recovery() {
        let mut p = ready_state(BoltVersion::V4_4);
        p.on_success(RequestKind::Run, &success(&[("qid", Value::Integer(0))]));
        p.on_failure();
        assert_eq!(p.state(), ConnectionState::Failed);
        assert_eq!(p.qid(), None);

        // anything may be sent while failed; the server will ignore it
        assert!(p.permits_send(&run()).is_ok());
        assert!(p.on_ignored().is_ok());
        assert_eq!(p.state(), ConnectionState::Interrupted);
        assert!(p.on_ignored().is_ok());

        p.on_success(RequestKind::Reset, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Ready);
        assert!(p.permits_send(&run()).is_ok());
    }

    #[test]
    fn test_ack_failure_recovery() {
        let mut p = ready_state(BoltVersion::V2_0);
        p.on_failure();
        p.on_success(RequestKind::AckFailure, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Ready);
    }

    #[test]
    fn test_ignored_outside_failed_is_protocol_error() {
        let mut p = ready_state(BoltVersion::V4_4);
        assert!(p.on_ignored().is_err());
    }

    #[test]
    fn test_transport_error_is_terminal() {
        let mut p = ready_state(BoltVersion::V4_4);
        p.on_transport_error();
        assert!(p.is_defunct());
        assert!(p.permits_send(&run()).is_err());
        assert!(p.permits_send(&Request::Reset).is_err());
        assert!(p.permits_send(&Request::Goodbye).is_err());
    }

    #[test]
    fn test_goodbye_permitted_from_live_states() {
        let p = ready_state(BoltVersion::V4_4);
        assert!(p.permits_send(&Request::Goodbye).is_ok());

        let mut p = ready_state(BoltVersion::V4_4);
        p.on_success(RequestKind::Run, &success(&[]));
        assert!(p.permits_send(&Request::Goodbye).is_ok());

        let mut p = ready_state(BoltVersion::V4_4);
        p.on_failure();
        assert!(p.permits_send(&Request::Goodbye).is_ok());
    }

    #[test]
    fn test_reset_drops_transaction() {
        let mut p = ready_state(BoltVersion::V4_4);
        p.on_success(RequestKind::Begin, &success(&[]));
        p.on_success(RequestKind::Run, &success(&[("qid", Value::Integer(5))]));
        p.on_success(RequestKind::Reset, &success(&[]));
        assert_eq!(p.state(), ConnectionState::Ready);
        assert_eq!(p.qid(), None);
        assert!(!p.in_transaction());
    }
}
