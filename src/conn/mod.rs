//! Connection state machine.

pub(crate) mod fsm;

mod builder;

pub use builder::EconnBuilder;
pub use fsm::{Conflict, Dir, State};

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time;

use crate::error::{Error, Result};
use crate::handler::EconnHandler;
use crate::message::{Message, MsgType, Payload, Props};
use crate::transport::EconnTransport;

use fsm::StateMachine;

/// Connection timer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EconnConf {
    /// How long to wait for the peer to answer a SETUP or UPDATE.
    pub timeout_setup: Duration,
    /// How long to wait for the HANGUP response after sending HANGUP.
    pub timeout_term: Duration,
}

impl Default for EconnConf {
    fn default() -> Self {
        Self {
            timeout_setup: Duration::from_millis(30_000),
            timeout_term: Duration::from_millis(5_000),
        }
    }
}

/// Decides the glare winner between two (userId, clientId) identities.
///
/// Both endpoints evaluate this with swapped arguments and must reach
/// opposite conclusions, so the rule is a strict total order: the greater
/// pair in lexicographic order wins.
pub fn is_winner(
    userid_self: &str,
    clientid_self: &str,
    userid_remote: &str,
    clientid_remote: &str,
) -> bool {
    (userid_self, clientid_self) > (userid_remote, clientid_remote)
}

/// What the single outstanding timer does when it fires.
#[derive(Debug, Clone, Copy)]
enum TimerKind {
    /// Waiting for the peer to answer a SETUP or UPDATE; closes with
    /// [`Error::TimedOut`].
    Setup,
    /// Waiting for the HANGUP response; closes with the saved error.
    Term,
    /// Deferred close after a local `end()`, so the close notification is
    /// the last event on the connection.
    Cancel,
}

pub(crate) struct Inner {
    pub(crate) userid_self: String,
    pub(crate) clientid_self: String,
    pub(crate) sessid_local: String,
    pub(crate) conf: EconnConf,
    pub(crate) transp: Option<Arc<dyn EconnTransport>>,
    pub(crate) state: Mutex<StateData>,
}

pub(crate) struct StateData {
    pub(crate) fsm: StateMachine,
    pub(crate) dir: Dir,
    pub(crate) conflict: Conflict,
    pub(crate) clientid_remote: String,
    pub(crate) sessid_remote: String,
    pub(crate) setup_err: Option<Error>,
    pub(crate) err: Option<Error>,
    pub(crate) tmr_local: Option<AbortHandle>,
    pub(crate) handler: Option<Arc<dyn EconnHandler>>,
}

impl StateData {
    fn cancel_timer(&mut self) {
        if let Some(tmr) = self.tmr_local.take() {
            tmr.abort();
        }
    }
}

impl Drop for StateData {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

/// One end-to-end signaling connection.
///
/// The handle is cheap to clone; all clones drive the same connection. The
/// application owns the connection and is expected to drop it shortly after
/// the close notification. Timer tasks hold only weak references, so
/// dropping the last handle cancels any pending timer.
#[derive(Clone)]
pub struct Econn {
    inner: Arc<Inner>,
}

impl Econn {
    /// Returns a builder for a connection owned by the given endpoint
    /// identity.
    pub fn builder(
        userid_self: impl Into<String>,
        clientid_self: impl Into<String>,
    ) -> EconnBuilder {
        EconnBuilder::new(userid_self, clientid_self)
    }

    fn state_data(&self) -> MutexGuard<'_, StateData> {
        self.inner.state.lock().expect("Lock failed")
    }

    fn handler(&self) -> Option<Arc<dyn EconnHandler>> {
        self.state_data().handler.clone()
    }

    /// The current signaling state.
    pub fn current_state(&self) -> State {
        self.state_data().fsm.state()
    }

    /// The call direction.
    pub fn current_dir(&self) -> Dir {
        self.state_data().dir
    }

    /// The recorded glare outcome.
    pub fn conflict(&self) -> Conflict {
        self.state_data().conflict
    }

    /// This endpoint's user id.
    pub fn userid(&self) -> &str {
        &self.inner.userid_self
    }

    /// This endpoint's client id.
    pub fn clientid(&self) -> &str {
        &self.inner.clientid_self
    }

    /// The random local session id, fixed for the connection lifetime.
    pub fn sessid_local(&self) -> &str {
        &self.inner.sessid_local
    }

    /// The peer's session id, empty until its first message arrives.
    pub fn sessid_remote(&self) -> String {
        self.state_data().sessid_remote.clone()
    }

    /// The peer's client id, empty until its first valid SETUP arrives.
    pub fn clientid_remote(&self) -> String {
        self.state_data().clientid_remote.clone()
    }

    /// The last fatal error, if any.
    pub fn setup_error(&self) -> Option<Error> {
        self.state_data().setup_err.clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<State> {
        self.state_data().fsm.subscribe_state()
    }

    /// Saves an error to be reported as the close reason when a later
    /// `end()` completes.
    pub fn set_error(&self, err: Error) {
        self.state_data().err = Some(err);
    }

    /// `true` if a PROPSYNC may be sent right now.
    pub fn can_send_propsync(&self) -> bool {
        self.current_state() == State::DatachanEstablished
    }

    /// Starts a new outgoing call: sends a SETUP request and arms the setup
    /// timer. Legal in `Idle` and, for a re-start, in `PendingOutgoing`.
    pub async fn start(&self, sdp: &str, props: Option<Props>) -> Result<()> {
        {
            let mut st = self.state_data();
            match st.fsm.state() {
                State::Idle | State::PendingOutgoing => {}
                other => {
                    warn!("start: invalid state '{}'", other);
                    return Err(Error::Protocol);
                }
            }

            st.fsm.set_state(State::PendingOutgoing);
            st.dir = Dir::Outgoing;
        }

        self.send_setup(false, sdp, props, false).await.map_err(|err| {
            warn!("start: send_setup failed ({})", err);
            err
        })?;

        if self.inner.conf.timeout_setup.is_zero() {
            warn!("start: illegal timer value 0");
            return Err(Error::Protocol);
        }

        self.arm_timer(self.inner.conf.timeout_setup, TimerKind::Setup);

        Ok(())
    }

    /// Answers an incoming call, or re-answers after a lost glare: sends a
    /// SETUP response and cancels the setup timer.
    pub async fn answer(&self, sdp: &str, props: Option<Props>) -> Result<()> {
        {
            let mut st = self.state_data();
            match st.fsm.state() {
                State::PendingIncoming | State::ConflictResolution => {}
                other => {
                    warn!("answer: cannot answer in wrong state '{}'", other);
                    return Err(Error::Protocol);
                }
            }

            st.cancel_timer();
        }

        self.send_setup(true, sdp, props, false).await?;

        self.state_data().fsm.set_state(State::Answered);

        Ok(())
    }

    /// Requests a renegotiation of the established call: sends an UPDATE
    /// request and arms the setup timer.
    pub async fn update_req(&self, sdp: &str, props: Option<Props>) -> Result<()> {
        {
            let mut st = self.state_data();
            match st.fsm.state() {
                State::Answered | State::DatachanEstablished => {}
                other => {
                    warn!("update_req: invalid state '{}'", other);
                    return Err(Error::Protocol);
                }
            }

            st.fsm.set_state(State::UpdateSent);
        }

        self.send_setup(false, sdp, props, true).await.map_err(|err| {
            warn!("update_req: send_setup failed ({})", err);
            err
        })?;

        if self.inner.conf.timeout_setup.is_zero() {
            warn!("update_req: illegal timer value 0");
            return Err(Error::Protocol);
        }

        self.arm_timer(self.inner.conf.timeout_setup, TimerKind::Setup);

        Ok(())
    }

    /// Answers a received UPDATE request: sends the UPDATE response and
    /// cancels the setup timer.
    pub async fn update_resp(&self, sdp: &str, props: Option<Props>) -> Result<()> {
        {
            let mut st = self.state_data();
            if st.fsm.state() != State::UpdateRecv {
                warn!(
                    "update_resp: cannot send UPDATE response in wrong state '{}'",
                    st.fsm.state()
                );
                return Err(Error::Protocol);
            }

            st.cancel_timer();
        }

        self.send_setup(true, sdp, props, true).await?;

        self.state_data().fsm.set_state(State::Answered);

        Ok(())
    }

    /// Sends a PROPSYNC carrying the given properties. Only legal once the
    /// data channel is established.
    pub async fn send_propsync(&self, resp: bool, props: Props) -> Result<()> {
        {
            let st = self.state_data();
            if st.fsm.state() != State::DatachanEstablished {
                warn!(
                    "send_propsync: cannot send PROPSYNC in wrong state '{}'",
                    st.fsm.state()
                );
                return Err(Error::Protocol);
            }
        }

        let mut msg = Message::new(
            Payload::Propsync { props },
            self.inner.sessid_local.clone(),
        );
        msg.resp = resp;

        self.transp_send(&msg).await.map_err(|err| {
            warn!("send_propsync: transport send failed ({})", err);
            err
        })
    }

    /// Reports that the application's data channel came up.
    pub fn set_datachan_established(&self) {
        let mut st = self.state_data();
        if st.fsm.state() == State::Answered {
            st.fsm.set_state(State::DatachanEstablished);
        } else {
            warn!(
                "set_datachan_established: illegal state '{}'",
                st.fsm.state()
            );
        }
    }

    /// Terminates the call from the local side.
    ///
    /// Before the call is established this sends a CANCEL and defers the
    /// close by one tick so the close notification stays the last event.
    /// With the data channel up it sends a HANGUP request and waits for the
    /// response, bounded by the termination timer.
    pub async fn end(&self) {
        enum EndAction {
            Defer,
            Cancel,
            Hangup,
            Ignore,
        }

        let action = {
            let mut st = self.state_data();
            info!("end (state={})", st.fsm.state());

            match st.fsm.state() {
                State::PendingIncoming => {
                    // ignore the incoming call
                    st.fsm.set_state(State::Terminating);
                    EndAction::Defer
                }
                State::PendingOutgoing | State::Answered | State::ConflictResolution => {
                    EndAction::Cancel
                }
                State::DatachanEstablished => EndAction::Hangup,
                other => {
                    warn!("end: cannot send CANCEL in state '{}'", other);
                    EndAction::Ignore
                }
            }
        };

        match action {
            EndAction::Defer => {
                self.arm_timer(Duration::from_millis(1), TimerKind::Cancel);
            }
            EndAction::Cancel => {
                if let Err(err) = self.send_cancel().await {
                    warn!("end: send_cancel failed ({})", err);
                }

                self.state_data().fsm.set_state(State::Terminating);

                self.arm_timer(Duration::from_millis(1), TimerKind::Cancel);
            }
            EndAction::Hangup => {
                if let Err(err) = self.send_hangup(false).await {
                    warn!("end: send_hangup failed ({})", err);
                }

                self.state_data().fsm.set_state(State::HangupSent);

                self.arm_timer(self.inner.conf.timeout_term, TimerKind::Term);
            }
            EndAction::Ignore => {}
        }
    }

    /// Tears the connection down and fires the close notification.
    ///
    /// Intended to be triggered by asynchronous events (timer expiry, fatal
    /// media errors, inbound CANCEL/HANGUP); a plain local teardown goes
    /// through [`Econn::end`]. The close notification fires exactly once and
    /// is the last event on the connection.
    pub async fn close(&self, err: Option<Error>) {
        match &err {
            Some(err) => info!("connection closed ({})", err),
            None => info!("connection closed (normal)"),
        }

        let send_cancel = {
            let mut st = self.state_data();
            st.cancel_timer();
            st.setup_err = err.clone();
            st.fsm.state() == State::PendingOutgoing
        };

        if send_cancel {
            // best effort; the peer may already be gone
            if let Err(err) = self.send_cancel().await {
                debug!("close: send_cancel failed ({})", err);
            }
        }

        let closeh = {
            let mut st = self.state_data();
            st.fsm.set_state(State::Terminating);
            st.handler.take()
        };

        // The handler is invoked last, so it observes the final state.
        if let Some(handler) = closeh {
            handler.on_close(self, err).await;
        }
    }

    /// Dispatches one inbound signaling message.
    ///
    /// Invalid messages (wrong sender, wrong session, wrong state) are
    /// logged and dropped; they never close the connection.
    pub async fn recv_message(&self, userid_sender: &str, clientid_sender: &str, msg: &Message) {
        match msg.msg_type() {
            MsgType::Setup => self.recv_setup(userid_sender, clientid_sender, msg).await,
            MsgType::Update => self.recv_update(userid_sender, clientid_sender, msg).await,
            MsgType::Cancel => self.recv_cancel(clientid_sender, msg).await,
            MsgType::Hangup => self.recv_hangup(msg).await,
            MsgType::Propsync => {
                warn!("recv: message not supported ({})", msg.msg_type());
            }
        }
    }

    async fn recv_setup(&self, userid_sender: &str, clientid_sender: &str, msg: &Message) {
        {
            let mut st = self.state_data();
            if !st.clientid_remote.is_empty() {
                if st.clientid_remote != clientid_sender {
                    info!(
                        "recv_setup: remote client id already set to '{}', \
                         dropping message from '{}'",
                        st.clientid_remote, clientid_sender
                    );
                    return;
                }
            } else {
                st.clientid_remote = clientid_sender.to_string();
            }
        }

        if msg.is_request() {
            self.handle_setup_request(userid_sender, clientid_sender, msg)
                .await;
        } else {
            self.handle_setup_response(userid_sender, clientid_sender, msg)
                .await;
        }
    }

    async fn handle_setup_request(
        &self,
        userid_sender: &str,
        clientid_sender: &str,
        msg: &Message,
    ) {
        let Payload::Setup { sdp, props } = &msg.payload else {
            return;
        };

        enum SetupAction {
            Incoming,
            ConflictLost,
            Ignore,
        }

        let action = {
            let mut st = self.state_data();
            match st.fsm.state() {
                State::Idle => {
                    st.fsm.set_state(State::PendingIncoming);
                    st.dir = Dir::Incoming;
                    st.sessid_remote = msg.sessid_sender.clone();
                    SetupAction::Incoming
                }
                State::PendingOutgoing => {
                    let winner = is_winner(
                        &self.inner.userid_self,
                        &self.inner.clientid_self,
                        userid_sender,
                        clientid_sender,
                    );

                    info!(
                        "[{}] conflict: is_winner={}",
                        self.inner.userid_self, winner
                    );

                    st.sessid_remote = msg.sessid_sender.clone();

                    if winner {
                        // Drop the remote offer; the peer loses and must
                        // send a new answer.
                        st.conflict = Conflict::Winner;
                        SetupAction::Ignore
                    } else {
                        // Our offer is dead; a new answer must go out.
                        st.conflict = Conflict::Loser;
                        st.fsm.set_state(State::ConflictResolution);
                        SetupAction::ConflictLost
                    }
                }
                other => {
                    warn!(
                        "[{}.{}] recv_setup: ignoring SETUP request in wrong state '{}'",
                        self.inner.userid_self, self.inner.clientid_self, other
                    );
                    SetupAction::Ignore
                }
            }
        };

        match action {
            SetupAction::Incoming => {
                self.arm_timer(self.inner.conf.timeout_setup, TimerKind::Setup);

                if let Some(handler) = self.handler() {
                    handler
                        .on_connect(
                            self,
                            msg.time,
                            userid_sender,
                            clientid_sender,
                            msg.age,
                            sdp,
                            props.as_ref(),
                        )
                        .await;
                }
            }
            SetupAction::ConflictLost => {
                // This notification is expected to drive a new answer().
                if let Some(handler) = self.handler() {
                    handler.on_answer(self, true, sdp, props.as_ref()).await;
                }
            }
            SetupAction::Ignore => {}
        }
    }

    async fn handle_setup_response(
        &self,
        userid_sender: &str,
        clientid_sender: &str,
        msg: &Message,
    ) {
        let Payload::Setup { sdp, props } = &msg.payload else {
            return;
        };

        {
            let mut st = self.state_data();
            match st.fsm.state() {
                State::PendingOutgoing | State::ConflictResolution => {}
                other => {
                    info!(
                        "recv_setup: ignoring SETUP response from {}|{} in wrong state '{}'",
                        userid_sender, clientid_sender, other
                    );
                    return;
                }
            }

            st.cancel_timer();
            st.fsm.set_state(State::Answered);
            st.sessid_remote = msg.sessid_sender.clone();
        }

        if let Some(handler) = self.handler() {
            handler.on_answer(self, false, sdp, props.as_ref()).await;
        }
    }

    async fn recv_update(&self, userid_sender: &str, clientid_sender: &str, msg: &Message) {
        {
            let st = self.state_data();
            if st.sessid_remote != msg.sessid_sender {
                warn!(
                    "recv_update: remote session id does not match ({} vs {})",
                    st.sessid_remote, msg.sessid_sender
                );
                return;
            }
        }

        if msg.is_request() {
            self.handle_update_request(userid_sender, clientid_sender, msg)
                .await;
        } else {
            self.handle_update_response(userid_sender, clientid_sender, msg)
                .await;
        }
    }

    async fn handle_update_request(
        &self,
        userid_sender: &str,
        clientid_sender: &str,
        msg: &Message,
    ) {
        let Payload::Update { sdp, props } = &msg.payload else {
            return;
        };

        let should_reset = {
            let mut st = self.state_data();

            if st.clientid_remote != clientid_sender {
                warn!(
                    "ignoring UPDATE request from wrong client id, expected '{}' got '{}'",
                    st.clientid_remote, clientid_sender
                );
                return;
            }

            match st.fsm.state() {
                State::Answered | State::DatachanEstablished => {
                    st.fsm.set_state(State::UpdateRecv);
                    false
                }
                State::UpdateSent => {
                    let winner = is_winner(
                        &self.inner.userid_self,
                        &self.inner.clientid_self,
                        userid_sender,
                        clientid_sender,
                    );

                    info!(
                        "handle_update_request: [{}] conflict: is_winner={}",
                        self.inner.userid_self, winner
                    );

                    if winner {
                        // Drop the remote request; our own offer stands and
                        // the peer must answer it.
                        return;
                    }

                    st.fsm.set_state(State::UpdateRecv);
                    true
                }
                other => {
                    warn!(
                        "[{}.{}] recv_update: ignoring UPDATE request in wrong state '{}'",
                        self.inner.userid_self, self.inner.clientid_self, other
                    );
                    return;
                }
            }
        };

        self.arm_timer(self.inner.conf.timeout_setup, TimerKind::Setup);

        if let Some(handler) = self.handler() {
            handler
                .on_update_request(
                    self,
                    userid_sender,
                    clientid_sender,
                    sdp,
                    props.as_ref(),
                    should_reset,
                )
                .await;
        }
    }

    async fn handle_update_response(
        &self,
        userid_sender: &str,
        clientid_sender: &str,
        msg: &Message,
    ) {
        let Payload::Update { sdp, props } = &msg.payload else {
            return;
        };

        {
            let mut st = self.state_data();

            if st.clientid_remote != clientid_sender {
                warn!(
                    "ignoring UPDATE response from wrong client id, expected '{}' got '{}'",
                    st.clientid_remote, clientid_sender
                );
                return;
            }

            if st.fsm.state() != State::UpdateSent {
                info!(
                    "recv_update: ignoring UPDATE response from {}|{} in wrong state '{}'",
                    userid_sender,
                    clientid_sender,
                    st.fsm.state()
                );
                return;
            }

            st.cancel_timer();
            st.fsm.set_state(State::Answered);
        }

        if let Some(handler) = self.handler() {
            handler.on_update_response(self, sdp, props.as_ref()).await;
        }
    }

    async fn recv_cancel(&self, clientid_sender: &str, msg: &Message) {
        {
            let mut st = self.state_data();

            if st.clientid_remote != clientid_sender {
                info!(
                    "recv_cancel: client id does not match (remote='{}', sender='{}')",
                    st.clientid_remote, clientid_sender
                );
                return;
            }

            match st.fsm.state() {
                State::PendingIncoming | State::Answered | State::DatachanEstablished => {}
                other => {
                    info!("recv_cancel: ignoring CANCEL in state '{}'", other);
                    return;
                }
            }

            if st.sessid_remote != msg.sessid_sender {
                warn!("recv_cancel: remote session id does not match");
                return;
            }

            st.fsm.set_state(State::Terminating);
        }

        self.close(Some(Error::Canceled)).await;
    }

    async fn recv_hangup(&self, msg: &Message) {
        {
            let mut st = self.state_data();

            if st.sessid_remote != msg.sessid_sender {
                warn!(
                    "recv_hangup: remote session id does not match ({} vs {})",
                    st.sessid_remote, msg.sessid_sender
                );
                return;
            }

            match st.fsm.state() {
                State::DatachanEstablished | State::HangupSent => {}
                other => {
                    warn!("recv_hangup: ignoring HANGUP in state '{}'", other);
                    return;
                }
            }

            st.fsm.set_state(State::HangupRecv);
        }

        // A HANGUP request gets a HANGUP response before the close.
        if msg.is_request() {
            if let Err(err) = self.send_hangup(true).await {
                warn!("recv_hangup: send_hangup failed ({})", err);
            }
        }

        self.state_data().fsm.set_state(State::Terminating);

        self.close(None).await;
    }

    async fn send_setup(
        &self,
        resp: bool,
        sdp: &str,
        props: Option<Props>,
        update: bool,
    ) -> Result<()> {
        let payload = if update {
            Payload::Update {
                sdp: sdp.to_string(),
                props,
            }
        } else {
            Payload::Setup {
                sdp: sdp.to_string(),
                props,
            }
        };

        let mut msg = Message::new(payload, self.inner.sessid_local.clone());
        msg.resp = resp;

        match self.transp_send(&msg).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("send_setup: transport send failed ({})", err);

                let mut st = self.state_data();
                st.setup_err = Some(err.clone());
                st.fsm.set_state(State::Terminating);

                Err(err)
            }
        }
    }

    async fn send_cancel(&self) -> Result<()> {
        let msg = Message::new(Payload::Cancel, self.inner.sessid_local.clone());

        self.transp_send(&msg).await
    }

    async fn send_hangup(&self, resp: bool) -> Result<()> {
        let mut msg = Message::new(Payload::Hangup, self.inner.sessid_local.clone());
        msg.resp = resp;

        self.transp_send(&msg).await
    }

    async fn transp_send(&self, msg: &Message) -> Result<()> {
        let Some(transp) = self.inner.transp.as_ref() else {
            return Err(Error::Unsupported);
        };

        transp.send(msg).await
    }

    /// Arms the single connection timer, replacing any previous one.
    fn arm_timer(&self, delay: Duration, kind: TimerKind) {
        let weak = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let conn = Econn { inner };

            // The stored token is this task's own handle; drop it before
            // closing so the close path does not abort the running task.
            let _ = conn.state_data().tmr_local.take();

            conn.timer_fired(kind).await;
        });

        let mut st = self.state_data();
        if let Some(prev) = st.tmr_local.replace(task.abort_handle()) {
            prev.abort();
        }
    }

    async fn timer_fired(&self, kind: TimerKind) {
        match kind {
            TimerKind::Setup => {
                info!("setup timeout (state={})", self.current_state());
                self.close(Some(Error::TimedOut)).await;
            }
            TimerKind::Term => {
                debug!("timeout waiting for HANGUP response");
                let err = self.state_data().err.clone();
                self.close(err).await;
            }
            TimerKind::Cancel => {
                debug!("closing connection after sending CANCEL");
                let err = self.state_data().err.clone();
                self.close(err).await;
            }
        }
    }
}

impl fmt::Debug for Econn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state_data();

        f.debug_struct("Econn")
            .field("state", &st.fsm.state())
            .field("dir", &st.dir)
            .field("sessid_local", &self.inner.sessid_local)
            .field("sessid_remote", &st.sessid_remote)
            .field("clientid_remote", &st.clientid_remote)
            .field("conflict", &st.conflict)
            .finish()
    }
}

impl fmt::Display for Econn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state_data();

        write!(f, "state: {}", st.fsm.state())?;
        if st.dir != Dir::Unknown {
            write!(f, " ({})", st.dir)?;
        }
        writeln!(f)?;

        writeln!(f, "remote client: {}", st.clientid_remote)?;
        writeln!(
            f,
            "session: {}|{}",
            self.inner.sessid_local, st.sessid_remote
        )?;
        writeln!(
            f,
            "timer: {}",
            if st.tmr_local.is_some() {
                "armed"
            } else {
                "not running"
            }
        )?;

        if let Some(err) = &st.setup_err {
            writeln!(f, "setup error: {}", err)?;
        }

        write!(f, "conflict: {}", st.conflict)
    }
}
