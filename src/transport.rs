//! Transport binding.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;

/// Outbound delivery of signaling messages.
///
/// The engine borrows the transport; it never owns the connection lifetime.
/// A send error propagates back through the operation that triggered it, and
/// there is no retry policy — the timers compensate for lost messages.
#[async_trait]
pub trait EconnTransport: Send + Sync + 'static {
    /// Deliver one signaling message to the peer.
    async fn send(&self, msg: &Message) -> Result<()>;
}
