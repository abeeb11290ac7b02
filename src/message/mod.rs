//! Signaling message model and JSON wire codec.

mod props;

pub use props::Props;

use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The wire protocol version this engine speaks.
///
/// Version checking is a single exact-match comparison; there is no forward
/// compatibility.
pub const PROTO_VERSION: &str = "3.0";

/// The five message types of the signaling protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    /// Call setup offer/answer.
    Setup,
    /// Renegotiation offer/answer on an established call.
    Update,
    /// Abandon a call before it is fully established.
    Cancel,
    /// Tear down an established call.
    Hangup,
    /// Synchronize session properties over an established call.
    Propsync,
}

impl MsgType {
    /// The wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Update => "update",
            Self::Cancel => "cancel",
            Self::Hangup => "hangup",
            Self::Propsync => "propsync",
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-type message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Session description plus optional properties.
    Setup {
        /// Opaque session description blob.
        sdp: String,
        /// Session properties; optional on the sending side.
        props: Option<Props>,
    },
    /// Renegotiated session description plus optional properties.
    Update {
        /// Opaque session description blob.
        sdp: String,
        /// Session properties.
        props: Option<Props>,
    },
    /// No payload.
    Cancel,
    /// No payload.
    Hangup,
    /// Properties only; mandatory.
    Propsync {
        /// Session properties.
        props: Props,
    },
}

impl Payload {
    /// The message type this payload belongs to.
    pub fn msg_type(&self) -> MsgType {
        match self {
            Self::Setup { .. } => MsgType::Setup,
            Self::Update { .. } => MsgType::Update,
            Self::Cancel => MsgType::Cancel,
            Self::Hangup => MsgType::Hangup,
            Self::Propsync { .. } => MsgType::Propsync,
        }
    }
}

/// One signaling message, in decoded form.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The sender's local session id.
    pub sessid_sender: String,
    /// `false` for a request, `true` for a response.
    pub resp: bool,
    /// Wall-clock timestamp in milliseconds; set by the decoder.
    pub time: u64,
    /// Staleness in milliseconds, derived on decode from the timestamps
    /// supplied by the caller.
    pub age: u64,
    /// The typed payload.
    pub payload: Payload,
}

/// The envelope as it appears on the wire. All fields are optional so the
/// decoder can report precisely which one is missing.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    mtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sessid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sdp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    props: Option<Props>,
}

impl Message {
    /// Creates a request message with zeroed timestamps.
    pub fn new(payload: Payload, sessid_sender: impl Into<String>) -> Self {
        Self {
            sessid_sender: sessid_sender.into(),
            resp: false,
            time: 0,
            age: 0,
            payload,
        }
    }

    /// The message type.
    pub fn msg_type(&self) -> MsgType {
        self.payload.msg_type()
    }

    /// `true` if this message is a request.
    pub fn is_request(&self) -> bool {
        !self.resp
    }

    /// Encodes the message into its JSON wire form.
    pub fn encode(&self) -> Result<String> {
        let mut wire = WireMessage {
            version: Some(PROTO_VERSION.to_string()),
            mtype: Some(self.msg_type().as_str().to_string()),
            sessid: Some(self.sessid_sender.clone()),
            resp: Some(self.resp),
            ..Default::default()
        };

        match &self.payload {
            Payload::Setup { sdp, props } | Payload::Update { sdp, props } => {
                wire.sdp = Some(sdp.clone());
                wire.props = props.clone();
            }
            Payload::Cancel | Payload::Hangup => {}
            Payload::Propsync { props } => {
                wire.props = Some(props.clone());
            }
        }

        serde_json::to_string(&wire).map_err(|err| Error::BadMessage(err.to_string()))
    }

    /// Decodes a JSON wire message.
    ///
    /// `curr_time` and `msg_time` are wall-clock milliseconds supplied by
    /// the caller; they populate [`Message::time`] and [`Message::age`].
    pub fn decode(curr_time: u64, msg_time: u64, raw: &str) -> Result<Message> {
        let wire: WireMessage = serde_json::from_str(raw).map_err(|err| {
            warn!("decode: malformed message: {}", err);
            Error::BadMessage(err.to_string())
        })?;

        let Some(version) = wire.version else {
            warn!("decode: missing 'version' field");
            return Err(Error::BadMessage("missing 'version' field".into()));
        };
        if version != PROTO_VERSION {
            warn!(
                "decode: version mismatch (us={}, msg={})",
                PROTO_VERSION, version
            );
            return Err(Error::Protocol);
        }

        let Some(mtype) = wire.mtype else {
            warn!("decode: missing 'type' field");
            return Err(Error::BadMessage("missing 'type' field".into()));
        };
        let Some(sessid) = wire.sessid else {
            warn!("decode: missing 'sessid' field");
            return Err(Error::BadMessage("missing 'sessid' field".into()));
        };
        let Some(resp) = wire.resp else {
            warn!("decode: missing 'resp' field");
            return Err(Error::BadMessage("missing 'resp' field".into()));
        };

        let payload = match mtype.as_str() {
            "setup" => {
                let sdp = require_sdp(wire.sdp)?;
                let Some(props) = wire.props else {
                    warn!("decode: setup without props");
                    return Err(Error::BadMessage("missing 'props' field".into()));
                };
                Payload::Setup {
                    sdp,
                    props: Some(props),
                }
            }
            "update" => {
                let sdp = require_sdp(wire.sdp)?;
                if wire.props.is_none() {
                    info!("decode: update without props");
                }
                Payload::Update {
                    sdp,
                    props: wire.props,
                }
            }
            "cancel" => Payload::Cancel,
            "hangup" => Payload::Hangup,
            "propsync" => {
                let Some(props) = wire.props else {
                    warn!("decode: propsync without props");
                    return Err(Error::BadMessage("missing 'props' field".into()));
                };
                Payload::Propsync { props }
            }
            other => {
                warn!("decode: unknown message type '{}'", other);
                return Err(Error::BadMessage(format!(
                    "unknown message type '{}'",
                    other
                )));
            }
        };

        Ok(Message {
            sessid_sender: sessid,
            resp,
            time: msg_time,
            age: if msg_time > curr_time {
                0
            } else {
                curr_time - msg_time
            },
            payload,
        })
    }
}

fn require_sdp(sdp: Option<String>) -> Result<String> {
    sdp.ok_or_else(|| {
        warn!("decode: missing 'sdp' field");
        Error::BadMessage("missing 'sdp' field".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_message(resp: bool) -> Message {
        let props: Props = [("videosend", "false")].into_iter().collect();
        let mut msg = Message::new(
            Payload::Setup {
                sdp: "v=0".into(),
                props: Some(props),
            },
            "Xq3vN",
        );
        msg.resp = resp;
        msg
    }

    #[test]
    fn encode_setup_request_wire_fields() {
        let encoded = setup_message(false).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(value["version"], "3.0");
        assert_eq!(value["type"], "setup");
        assert_eq!(value["sessid"], "Xq3vN");
        assert_eq!(value["resp"], false);
        assert_eq!(value["sdp"], "v=0");
        assert_eq!(value["props"]["videosend"], "false");
    }

    #[test]
    fn encode_cancel_omits_payload_fields() {
        let encoded = Message::new(Payload::Cancel, "Xq3vN").encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(value["type"], "cancel");
        assert!(value.get("sdp").is_none());
        assert!(value.get("props").is_none());
    }

    #[test]
    fn setup_round_trip_preserves_payload() {
        let msg = setup_message(true);
        let encoded = msg.encode().unwrap();

        let decoded = Message::decode(0, 0, &encoded).unwrap();

        assert_eq!(decoded.sessid_sender, msg.sessid_sender);
        assert_eq!(decoded.resp, msg.resp);
        assert_eq!(decoded.payload, msg.payload);
    }

    #[test]
    fn update_round_trip_without_props() {
        let msg = Message::new(
            Payload::Update {
                sdp: "v=0".into(),
                props: None,
            },
            "Xq3vN",
        );
        let encoded = msg.encode().unwrap();

        let decoded = Message::decode(0, 0, &encoded).unwrap();

        assert_eq!(decoded.payload, msg.payload);
    }

    #[test]
    fn propsync_round_trip() {
        let props: Props = [("screensend", "true")].into_iter().collect();
        let mut msg = Message::new(Payload::Propsync { props }, "Xq3vN");
        msg.resp = true;
        let encoded = msg.encode().unwrap();

        let decoded = Message::decode(0, 0, &encoded).unwrap();

        assert_eq!(decoded.payload, msg.payload);
        assert!(decoded.resp);
    }

    #[test]
    fn hangup_round_trip() {
        let encoded = Message::new(Payload::Hangup, "Xq3vN").encode().unwrap();

        let decoded = Message::decode(0, 0, &encoded).unwrap();

        assert_eq!(decoded.payload, Payload::Hangup);
        assert!(decoded.is_request());
    }

    #[test]
    fn decode_rejects_wrong_version() {
        let raw = r#"{"version":"2.0","type":"cancel","sessid":"abcde","resp":false}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::Protocol));
    }

    #[test]
    fn version_check_precedes_field_validation() {
        // Wrong version on a message that is also missing its sdp.
        let raw = r#"{"version":"9.9","type":"setup","sessid":"abcde","resp":false}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::Protocol));
    }

    #[test]
    fn decode_rejects_missing_version() {
        let raw = r#"{"type":"cancel","sessid":"abcde","resp":false}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_rejects_missing_sessid() {
        let raw = r#"{"version":"3.0","type":"cancel","resp":false}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_rejects_missing_resp() {
        let raw = r#"{"version":"3.0","type":"cancel","sessid":"abcde"}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let raw = r#"{"version":"3.0","type":"reinvite","sessid":"abcde","resp":false}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_rejects_setup_without_sdp() {
        let raw = r#"{"version":"3.0","type":"setup","sessid":"abcde","resp":false,"props":{}}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_rejects_setup_without_props() {
        let raw = r#"{"version":"3.0","type":"setup","sessid":"abcde","resp":false,"sdp":"v=0"}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_rejects_propsync_without_props() {
        let raw = r#"{"version":"3.0","type":"propsync","sessid":"abcde","resp":true}"#;

        assert_matches!(Message::decode(0, 0, raw), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert_matches!(Message::decode(0, 0, "not json"), Err(Error::BadMessage(_)));
    }

    #[test]
    fn decode_sets_time_and_age() {
        let raw = r#"{"version":"3.0","type":"hangup","sessid":"abcde","resp":false}"#;

        let decoded = Message::decode(5_000, 2_000, raw).unwrap();

        assert_eq!(decoded.time, 2_000);
        assert_eq!(decoded.age, 3_000);
    }

    #[test]
    fn age_is_zero_for_future_timestamps() {
        let raw = r#"{"version":"3.0","type":"hangup","sessid":"abcde","resp":false}"#;

        let decoded = Message::decode(1_000, 9_000, raw).unwrap();

        assert_eq!(decoded.time, 9_000);
        assert_eq!(decoded.age, 0);
    }
}
