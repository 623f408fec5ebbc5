//! gollama-server: chat server for the Gollama GitHub assistant.
//!
//! Clients talk to the assistant over a WebSocket (`/ws`) or a
//! server-sent-event stream (`/chat`). Each request is appended to its
//! session's history and handed to the tool-calling orchestrator; idle
//! sessions are reclaimed in the background.

pub mod channel;
pub mod handler;
pub mod protocol;
pub mod routes;
pub mod session;


pub use channel::{ChannelState, DuplexChannel};
pub use handler::RequestHandler;
pub use protocol::{Envelope, StreamEvent};
pub use routes::{router, serve, AppState};
pub use session::{SessionSnapshot, SessionStore};
