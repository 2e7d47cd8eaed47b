// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion into channel-agnostic events.
//!
//! Text, slash commands, shared contacts, and inline button presses become
//! [`InboundEvent`]s keyed by the sender's Telegram user id. Everything
//! else (stickers, photos, locations) is ignored.

use qarz_core::types::{InboundEvent, InboundMessage};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, User};

/// Checks whether the sender may talk to the bot.
///
/// An empty `allowed_users` list admits everyone. Otherwise the sender's
/// user ID or username (with or without `@`) must be listed.
/// Updates without a sender are never authorized.
pub fn is_authorized(user: Option<&User>, allowed_users: &[String]) -> bool {
    let Some(user) = user else {
        return false;
    };
    if allowed_users.is_empty() {
        return true;
    }

    let user_id = user.id.0.to_string();
    allowed_users.iter().any(|allowed| {
        if *allowed == user_id {
            return true;
        }
        let allowed_clean = allowed.strip_prefix('@').unwrap_or(allowed);
        user.username
            .as_deref()
            .is_some_and(|username| username.eq_ignore_ascii_case(allowed_clean))
    })
}

/// Checks whether the message is from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// The command name in `/name@bot args`, or `None` if `text` is not a command.
pub fn parse_command(text: &str) -> Option<String> {
    let rest = text.trim().strip_prefix('/')?;
    let word = rest.split_whitespace().next()?;
    let name = word.split('@').next().unwrap_or(word);
    (!name.is_empty()).then(|| name.to_lowercase())
}

/// Extracts the dialogue event carried by a message, if any.
pub fn extract_event(msg: &Message) -> Option<InboundEvent> {
    if let Some(contact) = msg.contact() {
        return Some(InboundEvent::Contact {
            phone: contact.phone_number.clone(),
            owner_identity: contact.user_id.map(|id| id.0.to_string()),
        });
    }

    let text = msg.text()?;
    Some(match parse_command(text) {
        Some(command) => InboundEvent::Command(command),
        None => InboundEvent::Text(text.to_string()),
    })
}

/// Converts a message and its event into an [`InboundMessage`].
///
/// Returns `None` for messages without a sender.
pub fn to_inbound_message(msg: &Message, event: InboundEvent) -> Option<InboundMessage> {
    let sender = msg.from.as_ref()?;
    Some(InboundMessage {
        id: msg.id.0.to_string(),
        identity: sender.id.0.to_string(),
        chat_id: msg.chat.id.0.to_string(),
        event,
        timestamp: msg.date.to_rfc3339(),
    })
}

/// Converts an inline button press into an [`InboundMessage`].
///
/// Presses without callback data are ignored. When the originating
/// message is unavailable the reply goes to the sender's private chat,
/// whose id equals the user id.
pub fn callback_to_inbound(query: &CallbackQuery) -> Option<InboundMessage> {
    let data = query.data.clone()?;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(query.from.id.0 as i64);

    Some(InboundMessage {
        id: query.id.to_string(),
        identity: query.from.id.0.to_string(),
        chat_id: chat_id.to_string(),
        event: InboundEvent::ButtonPress(data),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Whether a callback press came from a private chat, when that is known.
pub fn callback_is_dm(query: &CallbackQuery) -> bool {
    query
        .message
        .as_ref()
        .is_none_or(|m| matches!(m.chat().kind, ChatKind::Private(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_json(user_id: u64, username: Option<&str>) -> serde_json::Value {
        let mut user = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
        });
        if let Some(uname) = username {
            user["username"] = uname.into();
        }
        user
    }

    fn private_message(user_id: u64, username: Option<&str>, body: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": user_json(user_id, username),
        });
        if let (Some(obj), Some(extra)) = (json.as_object_mut(), body.as_object()) {
            obj.extend(extra.clone());
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn text_message(user_id: u64, username: Option<&str>, text: &str) -> Message {
        private_message(user_id, username, serde_json::json!({ "text": text }))
    }

    fn group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Test Group",
            },
            "from": user_json(user_id, None),
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    fn callback(user_id: u64, data: Option<&str>) -> CallbackQuery {
        let mut json = serde_json::json!({
            "id": "4382bfdwdsb323b2d9",
            "from": user_json(user_id, None),
            "chat_instance": "-42",
        });
        if let Some(data) = data {
            json["data"] = data.into();
        }
        serde_json::from_value(json).expect("failed to deserialize mock callback")
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        let msg = text_message(12345, None, "hello");
        assert!(is_authorized(msg.from.as_ref(), &[]));
    }

    #[test]
    fn authorized_by_user_id() {
        let msg = text_message(12345, None, "hello");
        assert!(is_authorized(msg.from.as_ref(), &["12345".into()]));
    }

    #[test]
    fn authorized_by_username_with_at_case_insensitive() {
        let msg = text_message(12345, Some("BarakaShop"), "hello");
        assert!(is_authorized(msg.from.as_ref(), &["@barakashop".into()]));
    }

    #[test]
    fn not_authorized_wrong_user() {
        let msg = text_message(12345, Some("testuser"), "hello");
        assert!(!is_authorized(msg.from.as_ref(), &["99999".into()]));
    }

    #[test]
    fn missing_sender_is_never_authorized() {
        assert!(!is_authorized(None, &[]));
    }

    #[test]
    fn dm_detection() {
        assert!(is_dm(&text_message(12345, None, "hello")));
        assert!(!is_dm(&group_message(12345, "hello")));
    }

    #[test]
    fn commands_are_normalized() {
        assert_eq!(parse_command("/start"), Some("start".into()));
        assert_eq!(parse_command("/Cancel@qarz_bot now"), Some("cancel".into()));
        assert_eq!(parse_command("start"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn text_and_command_events() {
        let text = extract_event(&text_message(1, None, "Alisher"));
        assert_eq!(text, Some(InboundEvent::Text("Alisher".into())));

        let command = extract_event(&text_message(1, None, "/shop_menu"));
        assert_eq!(command, Some(InboundEvent::Command("shop_menu".into())));
    }

    #[test]
    fn contact_event_carries_owner() {
        let msg = private_message(
            777,
            None,
            serde_json::json!({
                "contact": {
                    "phone_number": "998901234567",
                    "first_name": "Test",
                    "user_id": 777,
                }
            }),
        );
        assert_eq!(
            extract_event(&msg),
            Some(InboundEvent::Contact {
                phone: "998901234567".into(),
                owner_identity: Some("777".into()),
            })
        );
    }

    #[test]
    fn unsupported_message_is_ignored() {
        let msg = private_message(
            1,
            None,
            serde_json::json!({ "location": { "latitude": 41.3, "longitude": 69.2 } }),
        );
        assert_eq!(extract_event(&msg), None);
    }

    #[test]
    fn to_inbound_message_maps_fields() {
        let msg = text_message(12345, Some("testuser"), "hello");
        let inbound = to_inbound_message(&msg, InboundEvent::Text("hello".into())).unwrap();
        assert_eq!(inbound.id, "1");
        assert_eq!(inbound.identity, "12345");
        assert_eq!(inbound.chat_id, "12345");
        assert_eq!(inbound.event, InboundEvent::Text("hello".into()));
    }

    #[test]
    fn callback_becomes_button_press() {
        let inbound = callback_to_inbound(&callback(555, Some("history"))).unwrap();
        assert_eq!(inbound.identity, "555");
        assert_eq!(inbound.chat_id, "555");
        assert_eq!(inbound.event, InboundEvent::ButtonPress("history".into()));
    }

    #[test]
    fn callback_without_data_is_ignored() {
        let query = callback(555, None);
        assert!(callback_to_inbound(&query).is_none());
        assert!(callback_is_dm(&query));
    }
}
