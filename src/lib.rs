#![warn(missing_docs)]
//! # econn
//!
//! End-to-end call signaling engine.
//!
//! One [`Econn`] instance negotiates and tears down a single peer-to-peer
//! call between two endpoints identified by a (userId, clientId) pair. The
//! engine owns the signaling state machine, deterministic glare resolution,
//! the JSON wire framing and the setup/termination timers. Delivering the
//! messages is the job of an injected [`EconnTransport`]; the application
//! observes progress through the five notifications of [`EconnHandler`].

pub mod conn;
pub mod handler;
pub mod message;
pub mod transport;

mod error;

pub use conn::{is_winner, Conflict, Dir, Econn, EconnBuilder, EconnConf, State};
pub use error::{Error, Result};
pub use handler::EconnHandler;
pub use message::{Message, MsgType, Payload, Props, PROTO_VERSION};
pub use transport::EconnTransport;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[cfg(test)]
pub(crate) mod test_utils;

use rand::distr::{Alphanumeric, SampleString};

/// Length of the random local session id token.
pub(crate) const SESSID_LEN: usize = 5;

pub(crate) fn generate_sessid() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), SESSID_LEN)
}
