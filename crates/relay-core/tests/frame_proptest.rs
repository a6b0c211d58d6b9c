use proptest::prelude::*;
use relay_core::frame::{ClientEvent, SendMessagePayload};
use relay_core::{Envelope, ServerEvent};

/// Arbitrary base64-ish ciphertext/nonce strings. The server never decodes
/// these, so any printable string is a valid stand-in.
fn arb_ciphertext() -> impl Strategy<Value = String> {
    "[A-Za-z0-9+/=]{0,64}"
}

proptest! {
    /// `send_message` payloads round-trip through the `{event, data}` wire
    /// shape byte-for-byte on the ciphertext fields — the server forwards
    /// `encrypted`/`nonce` opaquely (`spec.md` §8, §9).
    #[test]
    fn send_message_payload_roundtrips(
        encrypted in arb_ciphertext(),
        nonce in arb_ciphertext(),
        is_group_chat in any::<bool>(),
        reply_to_id in prop::option::of(any::<i64>()),
    ) {
        let frame = serde_json::json!({
            "event": "send_message",
            "data": {
                "message": {"encrypted": encrypted, "nonce": nonce},
                "is_group_chat": is_group_chat,
                "reply_to_id": reply_to_id,
            }
        })
        .to_string();

        let decoded = ClientEvent::decode(&frame).expect("valid send_message frame");
        let ClientEvent::SendMessage(SendMessagePayload { message, is_group_chat: parsed_group, reply_to_id: parsed_reply, .. }) = decoded else {
            panic!("expected SendMessage");
        };
        prop_assert_eq!(message.encrypted, encrypted);
        prop_assert_eq!(message.nonce, nonce);
        prop_assert_eq!(parsed_group, is_group_chat);
        prop_assert_eq!(parsed_reply, reply_to_id);
    }

    /// Encoding a `receive_message` server event and parsing the result back
    /// as JSON carries the same ciphertext — the encode path never mutates
    /// the payload (`spec.md` §8 "never emits the decrypted bytes").
    #[test]
    fn receive_message_encode_preserves_ciphertext(
        sender in "[a-z0-9-]{1,20}",
        encrypted in arb_ciphertext(),
        nonce in arb_ciphertext(),
    ) {
        let event = ServerEvent::ReceiveMessage {
            sender: sender.clone(),
            message: Envelope { encrypted: encrypted.clone(), nonce: nonce.clone() },
            reply_to: None,
        };
        let encoded = event.encode();
        let parsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(parsed["event"].as_str().unwrap(), "receive_message");
        prop_assert_eq!(parsed["data"]["sender"].as_str().unwrap(), sender);
        prop_assert_eq!(parsed["data"]["message"]["encrypted"].as_str().unwrap(), encrypted);
        prop_assert_eq!(parsed["data"]["message"]["nonce"].as_str().unwrap(), nonce);
    }

    /// A frame whose `event` is outside the known set is always rejected,
    /// regardless of what `data` carries.
    #[test]
    fn unknown_event_always_rejected(event_name in "[a-z_]{1,20}", data in any::<bool>()) {
        prop_assume!(!matches!(
            event_name.as_str(),
            "join_chat" | "send_message" | "typing_start" | "typing_stop" | "delete_message"
                | "file_sending_start" | "file_sending_end" | "webrtc_offer" | "webrtc_answer"
                | "webrtc_ice_candidate" | "webrtc_end_call" | "disconnect_chat"
        ));
        let frame = serde_json::json!({ "event": event_name, "data": data }).to_string();
        prop_assert!(ClientEvent::decode(&frame).is_err());
    }
}
