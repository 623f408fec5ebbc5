//! Per-connection duplex channel.
//!
//! Outbound frames go through a bounded queue drained by a dedicated task.
//! Enqueueing never waits: a full queue closes the connection. Inbound
//! frames are read one at a time and each non-empty envelope is handed to
//! the caller's handler, which finishes before the next read starts.
//! Closing from either side cancels the channel's token, which callers
//! thread into in-flight work.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::Envelope;

pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Lifecycle of a channel. Never returns to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Open,
    Closing,
    Closed,
}

struct Shared {
    state: AtomicU8,
    cancel: CancellationToken,
}

impl Shared {
    fn begin_close(&self) {
        let _ = self
            .state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire);
        self.cancel.cancel();
    }
}

/// Sending half plus lifecycle of one connection. Clones share the connection.
#[derive(Clone)]
pub struct DuplexChannel {
    outbound: mpsc::Sender<String>,
    shared: Arc<Shared>,
}

impl DuplexChannel {
    /// Start draining outbound frames into `sink`. The returned handle
    /// finishes once the channel is closed.
    pub fn spawn<Si>(sink: Si, capacity: usize) -> (Self, JoinHandle<()>)
    where
        Si: Sink<String> + Send + 'static,
        Si::Error: Display,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shared = Arc::new(Shared {
            state: AtomicU8::new(OPEN),
            cancel: CancellationToken::new(),
        });
        let drain = tokio::spawn(drain_loop(sink, rx, shared.clone()));
        (
            Self {
                outbound: tx,
                shared,
            },
            drain,
        )
    }

    /// Queue an envelope without waiting. Returns false if the channel is
    /// closed or the queue was full, in which case the channel is now closing.
    pub fn send(&self, envelope: &Envelope) -> bool {
        if self.state() != ChannelState::Open {
            return false;
        }
        let json = match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode envelope");
                return false;
            }
        };
        match self.outbound.try_send(json) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full, closing connection");
                self.close();
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.close();
                false
            }
        }
    }

    pub fn close(&self) {
        self.shared.begin_close();
    }

    pub fn state(&self) -> ChannelState {
        match self.shared.state.load(Ordering::Acquire) {
            OPEN => ChannelState::Open,
            CLOSING => ChannelState::Closing,
            _ => ChannelState::Closed,
        }
    }

    /// Cancelled when the connection closes.
    pub fn token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    /// Read frames until the peer goes away, a frame fails to decode, or the
    /// channel is closed. Closes the channel on exit.
    ///
    /// Envelopes are handled strictly one at a time. While a handler runs,
    /// at most one further frame is read ahead so that a disconnect cancels
    /// the token instead of going unnoticed until the next write.
    pub async fn read_loop<St, E, H, Fut>(&self, stream: St, mut handler: H)
    where
        St: Stream<Item = Result<String, E>>,
        E: Display,
        H: FnMut(Envelope) -> Fut,
        Fut: Future<Output = ()>,
    {
        tokio::pin!(stream);
        let mut ahead: Option<Option<Result<String, E>>> = None;

        loop {
            if self.shared.cancel.is_cancelled() {
                break;
            }
            let frame = match ahead.take() {
                Some(frame) => frame,
                None => tokio::select! {
                    biased;
                    _ = self.shared.cancel.cancelled() => break,
                    frame = stream.next() => frame,
                },
            };

            let envelope = match frame {
                None => {
                    debug!("Peer closed connection");
                    break;
                }
                Some(Err(e)) => {
                    debug!(error = %e, "Read failed");
                    break;
                }
                Some(Ok(text)) => match serde_json::from_str::<Envelope>(&text) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(error = %e, "Malformed envelope, closing connection");
                        break;
                    }
                },
            };
            if envelope.content.is_empty() {
                continue;
            }

            let handled = handler(envelope);
            tokio::pin!(handled);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut handled => break,
                    frame = stream.next(), if ahead.is_none() => {
                        if !matches!(frame, Some(Ok(_))) {
                            self.close();
                        }
                        ahead = Some(frame);
                    }
                }
            }
        }
        self.close();
    }
}

async fn drain_loop<Si>(sink: Si, mut rx: mpsc::Receiver<String>, shared: Arc<Shared>)
where
    Si: Sink<String>,
    Si::Error: Display,
{
    tokio::pin!(sink);
    loop {
        let next = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => None,
            msg = rx.recv() => msg,
        };
        let Some(msg) = next else { break };

        let written = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            res = sink.send(msg) => res,
        };
        if let Err(e) = written {
            debug!(error = %e, "Write failed, closing connection");
            shared.begin_close();
            break;
        }
    }

    rx.close();
    let _ = sink.close().await;
    shared.state.store(CLOSED, Ordering::Release);
}
