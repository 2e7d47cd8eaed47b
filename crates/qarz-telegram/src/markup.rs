// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering prompt keyboards as Telegram reply markup.

use qarz_core::types::{InlineButton, Keyboard, Prompt};
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, ReplyMarkup,
};

/// The markup to attach to a prompt.
///
/// Telegram allows one markup per message, so inline buttons win over a
/// reply keyboard. A prompt with neither removes any keyboard left over
/// from the previous screen.
pub fn reply_markup(prompt: &Prompt) -> ReplyMarkup {
    if let Some(rows) = &prompt.inline {
        return ReplyMarkup::InlineKeyboard(inline_keyboard(rows));
    }
    match &prompt.keyboard {
        Some(keyboard) => ReplyMarkup::Keyboard(reply_keyboard(keyboard)),
        None => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

fn reply_keyboard(keyboard: &Keyboard) -> KeyboardMarkup {
    let rows = keyboard.rows.iter().enumerate().map(|(r, row)| {
        row.iter()
            .enumerate()
            .map(|(c, label)| {
                let button = KeyboardButton::new(label.clone());
                if keyboard.request_contact && r == 0 && c == 0 {
                    button.request(ButtonRequest::Contact)
                } else {
                    button
                }
            })
            .collect::<Vec<_>>()
    });
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn inline_keyboard(rows: &[Vec<InlineButton>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.token.clone()))
            .collect::<Vec<_>>()
    }))
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;

    #[test]
    fn plain_prompt_removes_keyboard() {
        assert!(matches!(
            reply_markup(&Prompt::text("Enter the name")),
            ReplyMarkup::KeyboardRemove(_)
        ));
    }

    #[test]
    fn contact_request_marks_first_button() {
        let prompt = Prompt::text("Share your number")
            .with_contact_request(vec![vec!["📱 Share".into()], vec!["🔙 Back".into()]]);
        let ReplyMarkup::Keyboard(markup) = reply_markup(&prompt) else {
            panic!("expected a reply keyboard");
        };
        assert!(markup.resize_keyboard);
        assert_eq!(markup.keyboard[0][0].text, "📱 Share");
        assert!(matches!(
            markup.keyboard[0][0].request,
            Some(ButtonRequest::Contact)
        ));
        assert!(markup.keyboard[1][0].request.is_none());
    }

    #[test]
    fn inline_buttons_carry_tokens() {
        let prompt = Prompt::text("Card")
            .with_keyboard(vec![vec!["ignored".into()]])
            .with_inline(vec![vec![
                InlineButton::new("➕", "+"),
                InlineButton::new("➖", "-"),
            ]]);
        let ReplyMarkup::InlineKeyboard(markup) = reply_markup(&prompt) else {
            panic!("expected an inline keyboard");
        };
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[0][1].text, "➖");
        assert!(matches!(
            &markup.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "+"
        ));
    }
}
