use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the signaling engine.
///
/// Fatal errors reach the application twice: once as the return value of the
/// operation that hit them, and once as the close reason when they terminate
/// the connection. The enum is `Clone + PartialEq` so close reasons can be
/// stored on the connection and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Empty identifier or missing required input at the API boundary.
    #[error("invalid argument")]
    InvalidArg,

    /// The decoder saw malformed JSON, a missing field or an unknown type.
    #[error("bad message: {0}")]
    BadMessage(String),

    /// Operation requested in the wrong state, unsupported wire version,
    /// or an illegal zero setup timeout.
    #[error("protocol error")]
    Protocol,

    /// No transport handler is bound to the connection.
    #[error("no transport handler bound")]
    Unsupported,

    /// The setup or termination timer expired.
    #[error("timed out")]
    TimedOut,

    /// The peer canceled the call, or a local `end()` fired before answer.
    #[error("canceled")]
    Canceled,

    /// The transport failed to deliver a message.
    #[error("transport: {0}")]
    Transport(String),
}
