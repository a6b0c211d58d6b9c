/// Wire envelope codec — `{event, data}` JSON objects over the channel.
///
/// No I/O here: `decode` takes text already read off the channel and either
/// returns a typed `ClientEvent` or a `RelayError::Protocol` for the caller to
/// count and drop (per `spec.md` §4.1 and §7 — rejected frames never close
/// the channel by themselves).
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;
use crate::types::{MAX_FRAME_BYTES, UserId};

/// The raw envelope shape, before the `event` tag is matched against the
/// known set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrame {
    pub event: String,
    #[serde(default = "Value::default")]
    pub data: Value,
}

// ── Shared payload fragments ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub encrypted: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdpPayload {
    pub sdp: String,
    #[serde(rename = "type")]
    pub sdp_type: String,
}

// ── Client → server payloads (spec.md §6) ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinChatPayload {
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub preference: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    pub room_type: String,
    #[serde(default)]
    pub group_join_method: Option<String>,
    #[serde(default)]
    pub group_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub message: Envelope,
    pub is_group_chat: bool,
    #[serde(default)]
    pub group_code: Option<String>,
    #[serde(default)]
    pub reply_to_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingPayload {
    pub is_group_chat: bool,
    #[serde(default)]
    pub group_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMessagePayload {
    #[serde(rename = "messageId", alias = "message_id")]
    pub message_id: String,
    #[serde(default, rename = "chatId")]
    pub chat_id: Option<String>,
    #[serde(rename = "isGroupChat")]
    pub is_group_chat: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayload {
    pub file_id: String,
    pub is_group_chat: bool,
    #[serde(default)]
    pub group_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalOfferPayload {
    pub sender_id: UserId,
    #[serde(default)]
    pub target_id: Option<UserId>,
    pub offer: SdpPayload,
    pub is_group_chat: bool,
    #[serde(default)]
    pub group_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalAnswerPayload {
    pub sender_id: UserId,
    #[serde(default)]
    pub target_id: Option<UserId>,
    pub answer: SdpPayload,
    pub is_group_chat: bool,
    #[serde(default)]
    pub group_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceCandidatePayload {
    pub sender_id: UserId,
    #[serde(default)]
    pub target_id: Option<UserId>,
    pub candidate: Value,
    pub is_group_chat: bool,
    #[serde(default)]
    pub group_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndCallPayload {
    pub sender_id: UserId,
    #[serde(default)]
    pub target_id: Option<UserId>,
    pub is_group_chat: bool,
    #[serde(default)]
    pub group_code: Option<String>,
}

/// A typed, validated inbound event. `RawFrame`s whose `event` is outside
/// this set, or whose `data` fails to parse against the matched shape, are
/// rejected before reaching here (`spec.md` §4.1).
#[derive(Debug, Clone)]
pub enum ClientEvent {
    JoinChat(JoinChatPayload),
    SendMessage(SendMessagePayload),
    TypingStart(TypingPayload),
    TypingStop(TypingPayload),
    DeleteMessage(DeleteMessagePayload),
    FileSendingStart(FilePayload),
    FileSendingEnd(FilePayload),
    WebrtcOffer(SignalOfferPayload),
    WebrtcAnswer(SignalAnswerPayload),
    WebrtcIceCandidate(IceCandidatePayload),
    WebrtcEndCall(EndCallPayload),
    DisconnectChat,
}

impl ClientEvent {
    /// Decode a raw text frame into a typed client event.
    ///
    /// Rejects frames over `MAX_FRAME_BYTES`, frames whose `event` is not in
    /// the enumerated set, and frames whose `data` does not match the shape
    /// required for that event.
    pub fn decode(text: &str) -> Result<Self, RelayError> {
        if text.len() > MAX_FRAME_BYTES {
            return Err(RelayError::protocol(format!(
                "frame of {} bytes exceeds {MAX_FRAME_BYTES} byte cap",
                text.len()
            )));
        }
        let raw: RawFrame = serde_json::from_str(text)
            .map_err(|e| RelayError::protocol(format!("malformed envelope: {e}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawFrame) -> Result<Self, RelayError> {
        fn parse<T: serde::de::DeserializeOwned>(event: &str, data: serde_json::Value) -> Result<T, RelayError> {
            serde_json::from_value(data)
                .map_err(|e| RelayError::protocol(format!("bad payload for {event}: {e}")))
        }
        Ok(match raw.event.as_str() {
            "join_chat" => ClientEvent::JoinChat(parse(&raw.event, raw.data)?),
            "send_message" => ClientEvent::SendMessage(parse(&raw.event, raw.data)?),
            "typing_start" => ClientEvent::TypingStart(parse(&raw.event, raw.data)?),
            "typing_stop" => ClientEvent::TypingStop(parse(&raw.event, raw.data)?),
            "delete_message" => ClientEvent::DeleteMessage(parse(&raw.event, raw.data)?),
            "file_sending_start" => ClientEvent::FileSendingStart(parse(&raw.event, raw.data)?),
            "file_sending_end" => ClientEvent::FileSendingEnd(parse(&raw.event, raw.data)?),
            "webrtc_offer" => ClientEvent::WebrtcOffer(parse(&raw.event, raw.data)?),
            "webrtc_answer" => ClientEvent::WebrtcAnswer(parse(&raw.event, raw.data)?),
            "webrtc_ice_candidate" => ClientEvent::WebrtcIceCandidate(parse(&raw.event, raw.data)?),
            "webrtc_end_call" => ClientEvent::WebrtcEndCall(parse(&raw.event, raw.data)?),
            "disconnect_chat" => ClientEvent::DisconnectChat,
            other => {
                return Err(RelayError::protocol(format!("unknown event: {other}")));
            }
        })
    }
}

/// An outbound event, ready to be serialized and written to a peer.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    ChatStarted { group_code: Option<String> },
    ReceiveMessage { sender: UserId, message: Envelope, reply_to: Option<i64> },
    GroupMembersUpdate { usernames: Vec<String> },
    UserJoinedGroup { username: String },
    UserLeftGroup { username: String },
    TypingStarted { sender: UserId },
    TypingStopped,
    MessageDeleted { message_id: String },
    FileSendingStarted { file_id: String, username: String },
    FileSendingEnded { file_id: String, username: String },
    PartnerDisconnected,
    WaitingForMatch,
    NoMatchFound,
    GroupNotFound,
    WebrtcOffer { sender_id: UserId, offer: SdpPayload },
    WebrtcAnswer { sender_id: UserId, answer: SdpPayload },
    WebrtcIceCandidate { sender_id: UserId, candidate: Value },
    WebrtcEndCall { sender_id: UserId },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ChatStarted { .. } => "chat_started",
            ServerEvent::ReceiveMessage { .. } => "receive_message",
            ServerEvent::GroupMembersUpdate { .. } => "group_members_update",
            ServerEvent::UserJoinedGroup { .. } => "user_joined_group",
            ServerEvent::UserLeftGroup { .. } => "user_left_group",
            ServerEvent::TypingStarted { .. } => "typing_started",
            ServerEvent::TypingStopped => "typing_stopped",
            ServerEvent::MessageDeleted { .. } => "message_deleted",
            ServerEvent::FileSendingStarted { .. } => "file_sending_started",
            ServerEvent::FileSendingEnded { .. } => "file_sending_ended",
            ServerEvent::PartnerDisconnected => "partner_disconnected",
            ServerEvent::WaitingForMatch => "waiting_for_match",
            ServerEvent::NoMatchFound => "no_match_found",
            ServerEvent::GroupNotFound => "group_not_found",
            ServerEvent::WebrtcOffer { .. } => "webrtc_offer",
            ServerEvent::WebrtcAnswer { .. } => "webrtc_answer",
            ServerEvent::WebrtcIceCandidate { .. } => "webrtc_ice_candidate",
            ServerEvent::WebrtcEndCall { .. } => "webrtc_end_call",
        }
    }

    /// Serialize into the `{event, data}` wire shape.
    pub fn encode(&self) -> String {
        let data = match self {
            ServerEvent::ChatStarted { group_code } => {
                serde_json::json!({ "groupCode": group_code })
            }
            ServerEvent::ReceiveMessage { sender, message, reply_to } => {
                serde_json::json!({ "sender": sender, "message": message, "reply_to": reply_to })
            }
            ServerEvent::GroupMembersUpdate { usernames } => serde_json::json!(usernames),
            ServerEvent::UserJoinedGroup { username } => serde_json::json!(username),
            ServerEvent::UserLeftGroup { username } => serde_json::json!(username),
            ServerEvent::TypingStarted { sender } => serde_json::json!({ "sender": sender }),
            ServerEvent::TypingStopped => serde_json::json!({}),
            ServerEvent::MessageDeleted { message_id } => {
                serde_json::json!({ "messageId": message_id })
            }
            ServerEvent::FileSendingStarted { file_id, username } => {
                serde_json::json!({ "fileId": file_id, "username": username })
            }
            ServerEvent::FileSendingEnded { file_id, username } => {
                serde_json::json!({ "fileId": file_id, "username": username })
            }
            ServerEvent::PartnerDisconnected => serde_json::json!({}),
            ServerEvent::WaitingForMatch => serde_json::json!({}),
            ServerEvent::NoMatchFound => serde_json::json!({}),
            ServerEvent::GroupNotFound => serde_json::json!({}),
            ServerEvent::WebrtcOffer { sender_id, offer } => {
                serde_json::json!({ "sender_id": sender_id, "offer": offer })
            }
            ServerEvent::WebrtcAnswer { sender_id, answer } => {
                serde_json::json!({ "sender_id": sender_id, "answer": answer })
            }
            ServerEvent::WebrtcIceCandidate { sender_id, candidate } => {
                serde_json::json!({ "sender_id": sender_id, "candidate": candidate })
            }
            ServerEvent::WebrtcEndCall { sender_id } => {
                serde_json::json!({ "sender_id": sender_id })
            }
        };
        serde_json::json!({ "event": self.name(), "data": data }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_join_chat() {
        let text = r#"{"event":"join_chat","data":{"user_id":"u1","username":"Ann","room_type":"group","group_join_method":"create"}}"#;
        match ClientEvent::decode(text).unwrap() {
            ClientEvent::JoinChat(p) => {
                assert_eq!(p.user_id, "u1");
                assert_eq!(p.username, "Ann");
            }
            other => panic!("expected JoinChat, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_event() {
        let text = r#"{"event":"nonsense","data":{}}"#;
        assert!(ClientEvent::decode(text).is_err());
    }

    #[test]
    fn rejects_non_json() {
        assert!(ClientEvent::decode("not json").is_err());
    }

    #[test]
    fn rejects_missing_required_field() {
        let text = r#"{"event":"send_message","data":{"is_group_chat":true}}"#;
        assert!(ClientEvent::decode(text).is_err());
    }

    #[test]
    fn rejects_oversized_frame() {
        let huge = "x".repeat(MAX_FRAME_BYTES + 1);
        let text = format!(r#"{{"event":"disconnect_chat","data":{huge:?}}}"#);
        assert!(ClientEvent::decode(&text).is_err());
    }

    #[test]
    fn encodes_message_deleted_with_canonical_casing() {
        let event = ServerEvent::MessageDeleted { message_id: "m-1".into() };
        let encoded = event.encode();
        assert!(encoded.contains(r#""messageId":"m-1""#));
    }

    #[test]
    fn delete_message_accepts_canonical_name() {
        let text = r#"{"event":"delete_message","data":{"messageId":"m-9","isGroupChat":true}}"#;
        match ClientEvent::decode(text).unwrap() {
            ClientEvent::DeleteMessage(p) => assert_eq!(p.message_id, "m-9"),
            other => panic!("expected DeleteMessage, got {other:?}"),
        }
    }

    #[test]
    fn envelope_roundtrips_byte_identical() {
        let env = Envelope { encrypted: "E1==".into(), nonce: "N1==".into() };
        let event = ServerEvent::ReceiveMessage {
            sender: "u2".into(),
            message: env.clone(),
            reply_to: None,
        };
        let encoded = event.encode();
        let raw: RawFrame = serde_json::from_str(&encoded).unwrap();
        let message = raw.data.get("message").unwrap();
        assert_eq!(message.get("encrypted").unwrap(), "E1==");
        assert_eq!(message.get("nonce").unwrap(), "N1==");
    }
}
