//! Test utilities for all unit tests in the library.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::conn::{Econn, EconnConf, State};
use crate::error::{Error, Result};
use crate::handler::EconnHandler;
use crate::message::{Message, MsgType, Payload, Props};
use crate::transport::EconnTransport;

pub const REMOTE_USER: &str = "bob";
pub const REMOTE_CLIENT: &str = "c-b";
pub const REMOTE_SESSID: &str = "bbbbb";

pub fn setup_req(sessid: &str, sdp: &str) -> Message {
    Message::new(
        Payload::Setup {
            sdp: sdp.into(),
            props: Some(Props::new()),
        },
        sessid,
    )
}

pub fn setup_resp(sessid: &str, sdp: &str) -> Message {
    let mut msg = setup_req(sessid, sdp);
    msg.resp = true;
    msg
}

pub fn update_req_msg(sessid: &str, sdp: &str) -> Message {
    Message::new(
        Payload::Update {
            sdp: sdp.into(),
            props: None,
        },
        sessid,
    )
}

pub fn update_resp_msg(sessid: &str, sdp: &str) -> Message {
    let mut msg = update_req_msg(sessid, sdp);
    msg.resp = true;
    msg
}

pub fn cancel_msg(sessid: &str) -> Message {
    Message::new(Payload::Cancel, sessid)
}

pub fn hangup_msg(sessid: &str, resp: bool) -> Message {
    let mut msg = Message::new(Payload::Hangup, sessid);
    msg.resp = resp;
    msg
}

/// A transport that records every message instead of delivering it.
#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<Message>>>,
    fail_at: Option<usize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose nth send (1-based) fails.
    pub fn failing_at(n: usize) -> Self {
        Self {
            sent: Default::default(),
            fail_at: Some(n),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_types(&self) -> Vec<MsgType> {
        self.sent().iter().map(Message::msg_type).collect()
    }

    pub fn last_sent(&self) -> Option<Message> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl EconnTransport for MockTransport {
    async fn send(&self, msg: &Message) -> Result<()> {
        let mut guard = self.sent.lock().unwrap();
        guard.push(msg.clone());

        if self.fail_at == Some(guard.len()) {
            return Err(Error::Transport("simulated failure".into()));
        }

        Ok(())
    }
}

/// Every notification the engine can raise, as recorded by
/// [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect {
        time: u64,
        userid: String,
        clientid: String,
        age: u64,
        sdp: String,
        props: Option<Props>,
    },
    Answer {
        from_conflict: bool,
        sdp: String,
        props: Option<Props>,
    },
    UpdateRequest {
        userid: String,
        clientid: String,
        sdp: String,
        props: Option<Props>,
        should_reset: bool,
    },
    UpdateResponse {
        sdp: String,
        props: Option<Props>,
    },
    Close {
        err: Option<Error>,
    },
}

/// A handler that records every notification for later inspection.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_event(&self) -> Option<Event> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn close_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Close { .. }))
            .count()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl EconnHandler for RecordingHandler {
    async fn on_connect(
        &self,
        _conn: &Econn,
        time: u64,
        userid_sender: &str,
        clientid_sender: &str,
        age: u64,
        sdp: &str,
        props: Option<&Props>,
    ) {
        self.record(Event::Connect {
            time,
            userid: userid_sender.into(),
            clientid: clientid_sender.into(),
            age,
            sdp: sdp.into(),
            props: props.cloned(),
        });
    }

    async fn on_answer(
        &self,
        _conn: &Econn,
        from_conflict: bool,
        sdp: &str,
        props: Option<&Props>,
    ) {
        self.record(Event::Answer {
            from_conflict,
            sdp: sdp.into(),
            props: props.cloned(),
        });
    }

    async fn on_update_request(
        &self,
        _conn: &Econn,
        userid_sender: &str,
        clientid_sender: &str,
        sdp: &str,
        props: Option<&Props>,
        should_reset: bool,
    ) {
        self.record(Event::UpdateRequest {
            userid: userid_sender.into(),
            clientid: clientid_sender.into(),
            sdp: sdp.into(),
            props: props.cloned(),
            should_reset,
        });
    }

    async fn on_update_response(&self, _conn: &Econn, sdp: &str, props: Option<&Props>) {
        self.record(Event::UpdateResponse {
            sdp: sdp.into(),
            props: props.cloned(),
        });
    }

    async fn on_close(&self, _conn: &Econn, err: Option<Error>) {
        self.record(Event::Close { err });
    }
}

/// Records events and immediately answers when a lost glare asks for one.
#[derive(Clone, Default)]
pub struct AnsweringHandler {
    pub inner: RecordingHandler,
}

#[async_trait]
impl EconnHandler for AnsweringHandler {
    async fn on_answer(&self, conn: &Econn, from_conflict: bool, sdp: &str, props: Option<&Props>) {
        self.inner.on_answer(conn, from_conflict, sdp, props).await;

        if from_conflict {
            conn.answer("sdp-reanswer", None)
                .await
                .expect("re-answer failed");
        }
    }
}

pub struct TestContext {
    pub conn: Econn,
    pub transport: MockTransport,
    pub handler: RecordingHandler,
}

impl TestContext {
    pub fn setup() -> Self {
        Self::new("alice", "c-a", EconnConf::default())
    }

    pub fn with_ids(userid: &str, clientid: &str) -> Self {
        Self::new(userid, clientid, EconnConf::default())
    }

    pub fn with_conf(conf: EconnConf) -> Self {
        Self::new("alice", "c-a", conf)
    }

    fn new(userid: &str, clientid: &str, conf: EconnConf) -> Self {
        let transport = MockTransport::new();
        let handler = RecordingHandler::new();

        let conn = Econn::builder(userid, clientid)
            .with_conf(conf)
            .with_transport(transport.clone())
            .with_handler(handler.clone())
            .build()
            .expect("failed to build connection");

        Self {
            conn,
            transport,
            handler,
        }
    }

    /// Drives the connection into `Answered` as the outgoing side.
    pub async fn establish_answered(&self) {
        self.conn
            .start("sdp-offer", None)
            .await
            .expect("start failed");
        self.conn
            .recv_message(
                REMOTE_USER,
                REMOTE_CLIENT,
                &setup_resp(REMOTE_SESSID, "sdp-answer"),
            )
            .await;

        assert_eq!(self.conn.current_state(), State::Answered);
    }

    /// Drives the connection into `DatachanEstablished`.
    pub async fn establish_datachan(&self) {
        self.establish_answered().await;
        self.conn.set_datachan_established();

        assert_eq!(self.conn.current_state(), State::DatachanEstablished);
    }
}
