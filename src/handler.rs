//! Application callback surface.

use async_trait::async_trait;

use crate::conn::Econn;
use crate::error::Error;
use crate::message::Props;

/// The notifications a connection raises toward the application.
///
/// All methods are invoked synchronously from within the engine, after the
/// state variable has been updated; a handler observing
/// [`Econn::current_state`] sees the new state. The handler must not touch
/// the connection except through the documented operations — answering a
/// lost glare by calling [`Econn::answer`] from [`on_answer`] is the
/// intended use. [`on_close`] is always the last notification on a
/// connection and fires exactly once.
///
/// [`on_answer`]: EconnHandler::on_answer
/// [`on_close`]: EconnHandler::on_close
#[async_trait]
#[allow(unused_variables)]
pub trait EconnHandler: Send + Sync + 'static {
    /// An inbound SETUP request was accepted; the peer is calling.
    async fn on_connect(
        &self,
        conn: &Econn,
        time: u64,
        userid_sender: &str,
        clientid_sender: &str,
        age: u64,
        sdp: &str,
        props: Option<&Props>,
    ) {
    }

    /// The peer answered our SETUP, or a lost glare requires a new local
    /// answer (`from_conflict == true`).
    async fn on_answer(&self, conn: &Econn, from_conflict: bool, sdp: &str, props: Option<&Props>) {
    }

    /// An inbound UPDATE request was accepted. `should_reset` is set when a
    /// lost update glare invalidated our own outstanding offer.
    async fn on_update_request(
        &self,
        conn: &Econn,
        userid_sender: &str,
        clientid_sender: &str,
        sdp: &str,
        props: Option<&Props>,
        should_reset: bool,
    ) {
    }

    /// The peer answered our UPDATE.
    async fn on_update_response(&self, conn: &Econn, sdp: &str, props: Option<&Props>) {}

    /// The connection terminated; `None` means a normal close. The
    /// application is expected to destroy the connection afterwards.
    async fn on_close(&self, conn: &Econn, err: Option<Error>) {}
}
