//! A single logical Bolt connection.
//!
//! The connection owns the byte stream and everything protocol-scoped: the
//! framing codec, its buffers, and the state machine. Messages on the wire
//! are strictly ordered and request/response pairing is FIFO, so all
//! operations take `&mut self` and the socket never has a second owner.
//!
//! The stream type is generic: plain TCP is provided, anything else that
//! implements `AsyncRead + AsyncWrite` (a TLS session, an in-memory pipe)
//! is supplied by the caller.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::ChunkCodec;
use crate::config::Config;
use crate::error::{BoltError, BoltResult};
use crate::handshake::{BoltVersion, HandshakeRequest, HANDSHAKE_RESPONSE_SIZE};
use crate::message::request::{AuthToken, HelloMessage, LogonMessage, RunMessage};
use crate::message::response::{Response, SuccessMessage};
use crate::message::{BeginMessage, Request};
use crate::packstream::Value;
use crate::state::{ConnectionState, ProtocolState, RequestKind};
use crate::stream::RecordStream;

/// A negotiated Bolt connection over some duplex byte stream.
pub struct Connection<S> {
    stream: S,
    codec: ChunkCodec,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
    protocol: ProtocolState,
    fetch_size: i64,
    read_timeout: Option<std::time::Duration>,
    query_timeout: Option<std::time::Duration>,
}

impl Connection<TcpStream> {
    /// Open a TCP connection, perform the handshake, and authenticate.
    pub async fn connect(config: &Config) -> BoltResult<Self> {
        let address = config.address.to_socket_addr();
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| BoltError::Timeout)??;
        stream.set_nodelay(true).ok();

        let mut connection = Self::negotiate(stream, config).await?;
        connection.authenticate(&config.user_agent, &config.auth).await?;
        Ok(connection)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Perform the handshake over an established stream.
    ///
    /// The stream may be any reliable duplex transport; TLS setup happens
    /// before this call, in whatever collaborator produced the stream.
    pub async fn negotiate(mut stream: S, config: &Config) -> BoltResult<Self> {
        let request = HandshakeRequest::new(&config.bolt_versions);
        stream.write_all(&request.to_bytes()).await?;
        stream.flush().await?;

        let mut reply = [0u8; HANDSHAKE_RESPONSE_SIZE];
        stream.read_exact(&mut reply).await?;
        let version = request.parse_response(reply)?;
        tracing::debug!(%version, "bolt handshake complete");

        Ok(Self {
            stream,
            codec: ChunkCodec::new(),
            read_buffer: BytesMut::with_capacity(8192),
            write_buffer: BytesMut::with_capacity(8192),
            protocol: ProtocolState::negotiated(version),
            fetch_size: config.fetch_size,
            read_timeout: config.read_timeout,
            query_timeout: config.query_timeout,
        })
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.protocol.version()
    }

    /// Current protocol state.
    pub fn state(&self) -> ConnectionState {
        self.protocol.state()
    }

    /// Server agent string, once authenticated.
    pub fn server_agent(&self) -> Option<&str> {
        self.protocol.server_agent()
    }

    /// Server-assigned connection id, once authenticated.
    pub fn connection_id(&self) -> Option<&str> {
        self.protocol.connection_id()
    }

    /// Whether the connection is inside an explicit transaction.
    pub fn in_transaction(&self) -> bool {
        self.protocol.in_transaction()
    }

    /// Authenticate for the negotiated version: INIT/HELLO carrying the
    /// credentials, or HELLO followed by LOGON from Bolt 5.1 on.
    pub async fn authenticate(&mut self, user_agent: &str, auth: &AuthToken) -> BoltResult<()> {
        let hello = HelloMessage::new(user_agent).with_auth(auth.clone());
        self.hello(hello).await?;
        if self.version().supports_logon() {
            self.logon(LogonMessage::new(auth.clone())).await?;
        }
        Ok(())
    }

    /// Send HELLO (or INIT) and record the server info it returns.
    pub async fn hello(&mut self, hello: HelloMessage) -> BoltResult<SuccessMessage> {
        self.exchange(Request::Hello(hello)).await
    }

    /// Send LOGON (Bolt 5.1+).
    pub async fn logon(&mut self, logon: LogonMessage) -> BoltResult<SuccessMessage> {
        self.exchange(Request::Logon(logon)).await
    }

    /// Submit a query and open its result stream.
    ///
    /// The returned stream borrows the connection; records are pulled from
    /// the server in `fetch_size` batches as the stream is consumed.
    pub async fn run(&mut self, mut run: RunMessage) -> BoltResult<RecordStream<'_, S>> {
        if run.tx_timeout.is_none() {
            run.tx_timeout = self.query_timeout;
        }
        let success = self.exchange(Request::Run(run)).await?;
        let keys = success.fields().unwrap_or_default();
        let qid = self.protocol.qid().unwrap_or(-1);
        let fetch_size = self.fetch_size;
        Ok(RecordStream::open(self, keys, qid, fetch_size))
    }

    /// Open an explicit transaction (Bolt 3+).
    pub async fn begin(&mut self, begin: BeginMessage) -> BoltResult<()> {
        self.exchange(Request::Begin(begin)).await?;
        Ok(())
    }

    /// Commit the open transaction; returns the bookmark, if any.
    pub async fn commit(&mut self) -> BoltResult<Option<String>> {
        let success = self.exchange(Request::Commit).await?;
        Ok(success.bookmark().map(str::to_string))
    }

    /// Roll back the open transaction.
    pub async fn rollback(&mut self) -> BoltResult<()> {
        self.exchange(Request::Rollback).await?;
        Ok(())
    }

    /// Abort outstanding work and clear any failure.
    pub async fn reset(&mut self) -> BoltResult<()> {
        self.exchange(Request::Reset).await?;
        Ok(())
    }

    /// Clear a failure on Bolt 1/2 connections.
    pub async fn ack_failure(&mut self) -> BoltResult<()> {
        self.exchange(Request::AckFailure).await?;
        Ok(())
    }

    /// Close the connection, sending GOODBYE where the version has it.
    pub async fn close(mut self) -> BoltResult<()> {
        let farewell_possible = !matches!(
            self.state(),
            ConnectionState::Disconnected | ConnectionState::Defunct
        );
        if farewell_possible && self.version().supports_hello() {
            let _ = self.send_request(&Request::Goodbye).await;
        }
        let _ = self.stream.shutdown().await;
        Ok(())
    }

    /// Send a request and fold its single response into the state machine.
    pub(crate) async fn exchange(&mut self, request: Request) -> BoltResult<SuccessMessage> {
        let kind = RequestKind::from(&request);
        self.send_request(&request).await?;
        self.handle_response(kind).await
    }

    /// Receive one response for `kind` and apply it. RECORDs are a protocol
    /// violation here; streaming reads them via [`Self::recv_response`].
    pub(crate) async fn handle_response(&mut self, kind: RequestKind) -> BoltResult<SuccessMessage> {
        match self.recv_response().await? {
            Response::Success(success) => {
                self.protocol.on_success(kind, &success);
                Ok(success)
            }
            Response::Failure(failure) => {
                tracing::warn!(code = %failure.code, "server failure");
                self.protocol.on_failure();
                Err(failure.into_error())
            }
            Response::Ignored => {
                self.protocol.on_ignored()?;
                Err(BoltError::Ignored)
            }
            Response::Record(_) => {
                self.protocol.on_transport_error();
                Err(BoltError::protocol("unexpected RECORD response"))
            }
        }
    }

    /// Frame and send one request.
    ///
    /// The state precondition is checked before anything touches the
    /// socket; an illegal (state, message) pair leaves the connection
    /// untouched.
    pub(crate) async fn send_request(&mut self, request: &Request) -> BoltResult<()> {
        self.protocol.permits_send(request)?;
        let structure = request.to_structure(self.version())?;

        self.write_buffer.clear();
        self.codec
            .encode(&Value::Structure(structure), &mut self.write_buffer)?;

        tracing::debug!(request = request.name(), "send");
        let write = async {
            self.stream.write_all(&self.write_buffer).await?;
            self.stream.flush().await
        };
        if let Err(e) = write.await {
            self.protocol.on_transport_error();
            return Err(e.into());
        }
        Ok(())
    }

    /// Receive the next response message.
    pub(crate) async fn recv_response(&mut self) -> BoltResult<Response> {
        loop {
            match self.codec.decode(&mut self.read_buffer) {
                Ok(Some(value)) => {
                    let structure = value.into_structure().ok_or_else(|| {
                        self.protocol.on_transport_error();
                        BoltError::protocol("response is not a structure")
                    })?;
                    let response = Response::from_structure(structure).map_err(|e| {
                        self.protocol.on_transport_error();
                        e
                    })?;
                    tracing::debug!(response = response.name(), "recv");
                    return Ok(response);
                }
                Ok(None) => {}
                Err(e) => {
                    // Corrupt framing or PackStream: the stream position is
                    // unrecoverable.
                    self.protocol.on_transport_error();
                    return Err(e);
                }
            }

            let read = self.stream.read_buf(&mut self.read_buffer);
            let n = match self.read_timeout {
                Some(limit) => match tokio::time::timeout(limit, read).await {
                    Ok(result) => result,
                    Err(_) => return Err(BoltError::Timeout),
                },
                None => read.await,
            };
            match n {
                Ok(0) => {
                    self.protocol.on_transport_error();
                    return Err(BoltError::ConnectionClosed);
                }
                Ok(_) => {}
                Err(e) => {
                    self.protocol.on_transport_error();
                    return Err(e.into());
                }
            }
        }
    }

    pub(crate) fn protocol_mut(&mut self) -> &mut ProtocolState {
        &mut self.protocol
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.protocol.state())
            .field("version", &self.protocol.version())
            .finish()
    }
}

/// Scripted in-memory peer used by the connection and streaming tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::message::signature;
    use crate::packstream::Structure;
    use std::collections::HashMap;
    use tokio::io::DuplexStream;

    /// Run a scripted server: answer the handshake with `version_reply`,
    /// then, for each incoming message, send the next batch of responses.
    /// Returns the decoded incoming messages for inspection.
    pub async fn scripted_server(
        mut peer: DuplexStream,
        version_reply: [u8; 4],
        mut batches: Vec<Vec<Structure>>,
    ) -> Vec<Structure> {
        use crate::handshake::BOLT_MAGIC;

        let mut handshake = [0u8; 20];
        peer.read_exact(&mut handshake).await.unwrap();
        assert_eq!(&handshake[0..4], &BOLT_MAGIC);
        peer.write_all(&version_reply).await.unwrap();

        let mut codec = ChunkCodec::new();
        let mut read_buffer = BytesMut::new();
        let mut seen = Vec::new();
        batches.reverse();

        while !batches.is_empty() {
            let value = loop {
                if let Some(value) = codec.decode(&mut read_buffer).unwrap() {
                    break value;
                }
                let mut tmp = [0u8; 4096];
                let n = peer.read(&mut tmp).await.unwrap();
                if n == 0 {
                    return seen;
                }
                read_buffer.extend_from_slice(&tmp[..n]);
            };
            seen.push(value.into_structure().expect("requests are structures"));

            let batch = batches.pop().unwrap();
            let mut out = BytesMut::new();
            for response in batch {
                codec
                    .encode(&Value::Structure(response), &mut out)
                    .unwrap();
            }
            peer.write_all(&out).await.unwrap();
        }
        seen
    }

    /// SUCCESS with the given metadata entries.
    pub fn success(entries: &[(&str, Value)]) -> Structure {
        let map: HashMap<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Structure::new(signature::SUCCESS, vec![Value::Map(map)])
    }

    /// RECORD with the given values.
    pub fn record(values: Vec<Value>) -> Structure {
        Structure::new(signature::RECORD, vec![Value::List(values)])
    }

    /// FAILURE with the given code.
    pub fn failure(code: &str, message: &str) -> Structure {
        let mut map = HashMap::new();
        map.insert("code".to_string(), Value::from(code));
        map.insert("message".to_string(), Value::from(message));
        Structure::new(signature::FAILURE, vec![Value::Map(map)])
    }

    /// IGNORED.
    pub fn ignored() -> Structure {
        Structure::new(signature::IGNORED, vec![])
    }

    /// Field list for a RUN success.
    pub fn fields(names: &[&str]) -> Value {
        Value::List(names.iter().map(|n| Value::from(*n)).collect())
    }

    /// A connected and authenticated v5.4 connection plus the server task.
    pub async fn authenticated_pair(
        extra_batches: Vec<Vec<Structure>>,
    ) -> (
        Connection<DuplexStream>,
        tokio::task::JoinHandle<Vec<Structure>>,
    ) {
        authenticated_pair_with_config(Config::default(), extra_batches).await
    }

    /// Like [`authenticated_pair`], with a caller-supplied configuration.
    pub async fn authenticated_pair_with_config(
        config: Config,
        mut extra_batches: Vec<Vec<Structure>>,
    ) -> (
        Connection<DuplexStream>,
        tokio::task::JoinHandle<Vec<Structure>>,
    ) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let mut batches = vec![
            vec![success(&[
                ("server", Value::from("Neo4j/5.13.0")),
                ("connection_id", Value::from("bolt-1")),
            ])],
            vec![success(&[])],
        ];
        batches.append(&mut extra_batches);
        let server_task =
            tokio::spawn(scripted_server(server, [0x00, 0x00, 0x04, 0x05], batches));

        let mut connection = Connection::negotiate(client, &config).await.unwrap();
        connection
            .authenticate("neobolt-test/0.1", &AuthToken::basic("neo4j", "secret"))
            .await
            .unwrap();
        (connection, server_task)
    }
}
