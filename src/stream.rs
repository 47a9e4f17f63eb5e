//! Result streaming.
//!
//! A [`RecordStream`] is the lazy, server-paged view of one query's result:
//! it borrows the connection, pulls records in `fetch_size` batches as the
//! consumer demands them, and returns the connection to its idle state on
//! exhaustion or early termination. [`QueryResult`] is the in-memory
//! counterpart for results that are already fully materialized; it iterates
//! with the same contract but performs no I/O.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::Connection;
use crate::error::{BoltError, BoltResult};
use crate::message::request::{DiscardMessage, PullMessage};
use crate::message::response::Response;
use crate::message::{Request, ResultSummary};
use crate::state::{ConnectionState, RequestKind};
use crate::value::Value;

/// One row of a result, with keyed access to its values.
///
/// The key list is shared across all records of a result, so a record owns
/// only its values.
#[derive(Debug, Clone)]
pub struct Record {
    keys: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Record {
    /// Create a record over a shared key list.
    pub fn new(keys: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    /// Column names, in result order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Values, ordered to match the keys.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by column name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|i| self.values.get(i))
    }

    /// Value by column position.
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value converted to a concrete type.
    pub fn get_as<T>(&self, key: &str) -> BoltResult<T>
    where
        T: TryFrom<Value, Error = BoltError>,
    {
        self.get(key)
            .cloned()
            .ok_or_else(|| BoltError::type_conversion(format!("column '{}' not found", key)))
            .and_then(T::try_from)
    }

    /// Whether a column exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Copy into a key-value map.
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .keys
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamStatus {
    /// The server still holds records (or has not said otherwise)
    Open,
    /// Terminal SUCCESS received; summary available
    Complete,
    /// Closed early by the consumer; remainder discarded
    Closed,
    /// A failure ended the stream; the connection needs a reset
    Failed,
}

/// A lazy, server-paged sequence of records for one query.
///
/// Records arrive in server order. The stream holds at most one batch
/// locally and issues the next PULL only when the buffer runs dry and the
/// consumer asks for more. Dropping the stream without finishing it leaves
/// the connection in the streaming state: call [`RecordStream::close`] (or
/// drain it) so the remainder is discarded server-side.
pub struct RecordStream<'a, S> {
    connection: &'a mut Connection<S>,
    keys: Arc<Vec<String>>,
    qid: i64,
    fetch_size: i64,
    buffer: VecDeque<Record>,
    status: StreamStatus,
    summary: Option<ResultSummary>,
}

impl<'a, S: AsyncRead + AsyncWrite + Unpin> RecordStream<'a, S> {
    pub(crate) fn open(
        connection: &'a mut Connection<S>,
        keys: Vec<String>,
        qid: i64,
        fetch_size: i64,
    ) -> Self {
        Self {
            connection,
            keys: Arc::new(keys),
            qid,
            fetch_size,
            buffer: VecDeque::new(),
            status: StreamStatus::Open,
            summary: None,
        }
    }

    /// Column names announced by the server.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Server-assigned query id (-1 when the server did not assign one).
    pub fn qid(&self) -> i64 {
        self.qid
    }

    /// State of the underlying connection.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Terminal metadata, present once the stream completed or was closed.
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }

    /// The next record, or `None` once the stream is finished.
    ///
    /// Issues a PULL when the local buffer is empty.
    pub async fn next(&mut self) -> BoltResult<Option<Record>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            match self.status {
                StreamStatus::Open => self.pull_batch().await?,
                _ => return Ok(None),
            }
        }
    }

    /// Close the stream early, discarding undelivered records server-side.
    ///
    /// Locally buffered records are dropped. On a healthy connection this
    /// returns it to its idle (Ready/TxReady) state. Closing a finished
    /// stream is a no-op.
    pub async fn close(&mut self) -> BoltResult<()> {
        self.buffer.clear();
        if self.status != StreamStatus::Open {
            return Ok(());
        }
        let discard = DiscardMessage::all().with_qid(self.qid);
        self.connection
            .send_request(&Request::Discard(discard))
            .await?;
        loop {
            match self.connection.recv_response().await? {
                Response::Success(success) => {
                    self.connection
                        .protocol_mut()
                        .on_success(RequestKind::Discard, &success);
                    if !success.has_more() {
                        self.summary = Some(ResultSummary::from_success(&success));
                        self.status = StreamStatus::Closed;
                        return Ok(());
                    }
                    // has_more on a full discard is unexpected but legal;
                    // keep discarding.
                    let discard = DiscardMessage::all().with_qid(self.qid);
                    self.connection
                        .send_request(&Request::Discard(discard))
                        .await?;
                }
                Response::Failure(failure) => {
                    self.connection.protocol_mut().on_failure();
                    self.status = StreamStatus::Failed;
                    return Err(failure.into_error());
                }
                Response::Ignored => {
                    self.connection.protocol_mut().on_ignored()?;
                    self.status = StreamStatus::Failed;
                    return Err(BoltError::Ignored);
                }
                Response::Record(_) => {
                    self.connection.protocol_mut().on_transport_error();
                    self.status = StreamStatus::Failed;
                    return Err(BoltError::protocol("RECORD received after DISCARD"));
                }
            }
        }
    }

    /// Discard whatever remains and return the terminal metadata.
    pub async fn consume(mut self) -> BoltResult<ResultSummary> {
        self.close().await?;
        Ok(self.summary.take().unwrap_or_default())
    }

    /// Drain the stream into an in-memory [`QueryResult`].
    pub async fn collect(mut self) -> BoltResult<QueryResult> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(QueryResult::new(
            self.keys.clone(),
            records,
            self.summary.take().unwrap_or_default(),
        ))
    }

    async fn pull_batch(&mut self) -> BoltResult<()> {
        let pull = PullMessage::with_n(self.fetch_size);
        self.connection.send_request(&Request::Pull(pull)).await?;
        loop {
            match self.connection.recv_response().await? {
                Response::Record(record) => {
                    let mut values = Vec::with_capacity(record.values.len());
                    for wire in record.values {
                        match Value::from_wire(wire) {
                            Ok(value) => values.push(value),
                            Err(e) => {
                                // Undecodable payload means the rest of the
                                // stream cannot be trusted either.
                                self.connection.protocol_mut().on_transport_error();
                                self.status = StreamStatus::Failed;
                                return Err(e.into());
                            }
                        }
                    }
                    self.buffer.push_back(Record::new(self.keys.clone(), values));
                }
                Response::Success(success) => {
                    self.connection
                        .protocol_mut()
                        .on_success(RequestKind::Pull, &success);
                    if !success.has_more() {
                        self.summary = Some(ResultSummary::from_success(&success));
                        self.status = StreamStatus::Complete;
                    }
                    return Ok(());
                }
                Response::Failure(failure) => {
                    self.connection.protocol_mut().on_failure();
                    self.buffer.clear();
                    self.status = StreamStatus::Failed;
                    return Err(failure.into_error());
                }
                Response::Ignored => {
                    self.connection.protocol_mut().on_ignored()?;
                    self.status = StreamStatus::Failed;
                    return Err(BoltError::Ignored);
                }
            }
        }
    }
}

impl<S> fmt::Debug for RecordStream<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream")
            .field("qid", &self.qid)
            .field("status", &self.status)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

/// A fully materialized result.
///
/// Iterates records in server order with the same contract as
/// [`RecordStream`], but everything is already local: no I/O happens and
/// early termination needs no DISCARD.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    keys: Arc<Vec<String>>,
    records: VecDeque<Record>,
    summary: ResultSummary,
}

impl QueryResult {
    /// Create a result from materialized records.
    pub fn new(keys: Arc<Vec<String>>, records: Vec<Record>, summary: ResultSummary) -> Self {
        Self {
            keys,
            records: records.into(),
            summary,
        }
    }

    /// Result with no records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Terminal metadata.
    pub fn summary(&self) -> &ResultSummary {
        &self.summary
    }

    /// Records not yet iterated.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    /// The sole record of the result; fails on zero or multiple records.
    pub fn single(mut self) -> BoltResult<Record> {
        if self.records.len() != 1 {
            return Err(BoltError::type_conversion(format!(
                "expected a single record, got {}",
                self.records.len()
            )));
        }
        self.records
            .pop_front()
            .ok_or_else(|| BoltError::type_conversion("expected a single record, got 0"))
    }

    /// The first record, if any.
    pub fn first(mut self) -> Option<Record> {
        self.records.pop_front()
    }
}

impl Iterator for QueryResult {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.pop_front()
    }
}
