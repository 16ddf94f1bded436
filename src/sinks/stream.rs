//! TCP stream sink
//!
//! Listens on a port and accepts exactly one client in a background task.
//! Once the client is connected, the task publishes a channel sender
//! through a `OnceLock`; `emit` pushes lines into that channel and the
//! same task writes and flushes them in order.
//!
//! ```text
//! emit() ──► OnceLock<Sender>? ──none──► drop (no client yet)
//!                 │
//!                 └─some──► mpsc ──► writer task ──► socket (flush per line)
//! ```
//!
//! Events emitted before the client connects are discarded. There is no
//! backlog and no replay. The queue between `emit` and the writer holds at
//! most `WRITE_QUEUE_CAPACITY` lines; when a slow client lets it fill up,
//! further events are dropped until the writer catches up.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{format_wire_line, DataSink};
use crate::types::{ConfigError, PatientId, SinkError, TransportError};

/// Lines queued for the writer before `emit` starts dropping
pub const WRITE_QUEUE_CAPACITY: usize = 1024;

/// Pause after a failed accept before trying again
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Single-client TCP sink
pub struct StreamSink {
    local_addr: SocketAddr,
    /// Set once, by the accept task, when the client connects
    writer: Arc<OnceLock<mpsc::Sender<String>>>,
    peer: Arc<OnceLock<SocketAddr>>,
    /// Events dropped because the write queue was full
    dropped: AtomicU64,
    task: JoinHandle<()>,
}

impl StreamSink {
    /// Bind on all interfaces at `port` and start waiting for a client
    ///
    /// Must be called from within a tokio runtime. Port 0 picks an
    /// ephemeral port; see `local_addr()`.
    pub async fn bind(port: u16) -> Result<Self, ConfigError> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port))).await
    }

    /// Bind on a specific address
    pub async fn bind_addr(addr: SocketAddr) -> Result<Self, ConfigError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ConfigError::PortUnavailable {
                port: addr.port(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ConfigError::PortUnavailable {
                port: addr.port(),
                source,
            })?;

        info!(addr = %local_addr, "TCP server started");

        let writer = Arc::new(OnceLock::new());
        let peer = Arc::new(OnceLock::new());
        let task = tokio::spawn(accept_and_forward(
            listener,
            Arc::clone(&writer),
            Arc::clone(&peer),
        ));

        Ok(Self {
            local_addr,
            writer,
            peer,
            dropped: AtomicU64::new(0),
            task,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether a client has been accepted
    pub fn is_connected(&self) -> bool {
        self.writer.get().is_some()
    }

    /// Address of the accepted client, if any
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer.get().copied()
    }

    /// Lines waiting for the writer task
    pub fn queued_lines(&self) -> usize {
        self.writer
            .get()
            .map_or(0, |tx| tx.max_capacity() - tx.capacity())
    }

    /// Events dropped because the client was not keeping up
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DataSink for StreamSink {
    fn emit(
        &self,
        patient_id: PatientId,
        timestamp_millis: i64,
        label: &str,
        value: &str,
    ) -> Result<(), SinkError> {
        let Some(tx) = self.writer.get() else {
            debug!(patient_id, label, "no client connected, dropping event");
            return Ok(());
        };

        let mut line = format_wire_line(patient_id, timestamp_millis, label, value);
        line.push('\n');

        match tx.try_send(line) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(patient_id, label, "client not keeping up, dropping event");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => {
                Err(SinkError::Transport(TransportError::Disconnected))
            }
        }
    }
}

impl Drop for StreamSink {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Accept one client, publish its sender, then forward lines until the
/// channel closes or a write fails.
async fn accept_and_forward(
    listener: TcpListener,
    writer: Arc<OnceLock<mpsc::Sender<String>>>,
    peer: Arc<OnceLock<SocketAddr>>,
) {
    let listener_ref = &listener;
    let (mut stream, addr) = accept_with_retry(move || listener_ref.accept()).await;
    // At most one client for the sink's lifetime
    drop(listener);

    let _ = stream.set_nodelay(true);
    let _ = peer.set(addr);

    let (tx, rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
    if writer.set(tx).is_err() {
        return;
    }
    info!(client = %addr, "client connected");

    forward_lines(&mut stream, rx).await;
    info!(client = %addr, "client stream closed");
}

/// Keep accepting until one attempt succeeds
///
/// Accept errors such as `ECONNABORTED` or `EMFILE` are transient, so each
/// one is logged and retried after a short pause.
async fn accept_with_retry<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                warn!(error = %TransportError::Accept(e), "accept error");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

async fn forward_lines(stream: &mut TcpStream, mut rx: mpsc::Receiver<String>) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = write_line(stream, &line).await {
            warn!(error = %TransportError::Write(e), "dropping client");
            return;
        }
    }
}

/// Write one line and flush it straight away
async fn write_line(stream: &mut TcpStream, line: &str) -> io::Result<()> {
    stream.write_all(line.as_bytes()).await?;
    stream.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    async fn wait_connected(sink: &StreamSink) {
        for _ in 0..200 {
            if sink.is_connected() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("client never connected");
    }

    async fn bind_local() -> StreamSink {
        StreamSink::bind_addr("127.0.0.1:0".parse().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_emit_without_client_is_dropped() {
        let sink = bind_local().await;
        assert!(!sink.is_connected());
        assert!(sink.peer_addr().is_none());
        sink.emit(1, 1000, "Alert", "triggered").unwrap();
    }

    #[tokio::test]
    async fn test_lines_delivered_in_order() {
        let sink = bind_local().await;
        let client = TcpStream::connect(sink.local_addr()).await.unwrap();
        wait_connected(&sink).await;
        assert!(sink.peer_addr().is_some());

        for i in 1..=5u32 {
            sink.emit(i, i64::from(i) * 10, "Alert", "triggered").unwrap();
        }

        let mut lines = BufReader::new(client).lines();
        for i in 1..=5u32 {
            let line = lines.next_line().await.unwrap().unwrap();
            assert_eq!(line, format!("{},{},Alert,triggered", i, i * 10));
        }
    }

    #[tokio::test]
    async fn test_bind_conflict_is_config_error() {
        let sink = bind_local().await;
        let err = StreamSink::bind_addr(sink.local_addr()).await.err().unwrap();
        assert!(matches!(err, ConfigError::PortUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_stalled_client_queue_is_bounded() {
        let sink = bind_local().await;
        let _client = TcpStream::connect(sink.local_addr()).await.unwrap();
        wait_connected(&sink).await;

        // The writer task shares this single-threaded runtime and cannot run
        // until we yield, so the queue fills up and the rest is dropped.
        let extra = 100;
        for i in 0..(WRITE_QUEUE_CAPACITY + extra) {
            sink.emit(i as PatientId, 0, "Alert", "triggered").unwrap();
        }
        assert_eq!(sink.queued_lines(), WRITE_QUEUE_CAPACITY);
        assert_eq!(sink.dropped_events(), extra as u64);
    }

    #[tokio::test]
    async fn test_accept_retries_after_transient_errors() {
        let mut attempts = 0u32;
        let accepted = accept_with_retry(|| {
            attempts += 1;
            let attempt = attempts;
            async move {
                if attempt < 3 {
                    Err(io::Error::from(io::ErrorKind::ConnectionAborted))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(accepted, 3);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_emit_after_client_gone_reports_disconnect() {
        let sink = bind_local().await;
        let client = TcpStream::connect(sink.local_addr()).await.unwrap();
        wait_connected(&sink).await;
        drop(client);

        // The writer task notices the reset on a later write and exits;
        // after that the channel is closed.
        let mut saw_disconnect = false;
        for i in 0..200u32 {
            match sink.emit(i, 0, "Alert", "resolved") {
                Ok(()) => tokio::time::sleep(Duration::from_millis(10)).await,
                Err(err) => {
                    assert!(matches!(
                        err,
                        SinkError::Transport(TransportError::Disconnected)
                    ));
                    saw_disconnect = true;
                    break;
                }
            }
        }
        assert!(saw_disconnect);
    }
}
