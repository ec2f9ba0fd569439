//! Bidirectional live sessions over WebSocket.

pub mod connection;
pub mod protocol;
pub mod session;
pub mod ws;

pub use connection::{drive_session, Teardown, TeardownReason};
pub use protocol::{ClientMessage, ServerMessage};
pub use session::{LiveSession, SessionPolicy};
