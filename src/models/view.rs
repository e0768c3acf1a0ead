use chrono::{ DateTime, Local, TimeZone, Utc };
use std::fmt::Display;

use super::chat::{ Conversation, Role };

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageView {
    pub role: Role,
    pub author: &'static str,
    pub content: String,
    pub time: String,
    pub placeholder: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationView {
    pub messages: Vec<MessageView>,
    pub pending: bool,
    /// Index of the newest entry; the view is always scrolled to it.
    pub scroll_to: usize,
}

/// `HH:MM`, 24-hour, zero-padded, in the given zone.
pub fn format_time<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
    where Tz: TimeZone, Tz::Offset: Display
{
    ts.with_timezone(tz).format("%H:%M").to_string()
}

pub fn project<Tz>(conversation: &Conversation, pending: bool, tz: &Tz) -> ConversationView
    where Tz: TimeZone, Tz::Offset: Display
{
    let now = Utc::now();
    let messages: Vec<MessageView> = conversation
        .messages()
        .iter()
        .enumerate()
        .map(|(idx, msg)| MessageView {
            role: msg.role(),
            author: msg.role().label(),
            content: msg.content().to_string(),
            time: format_time(msg.ts.as_ref().unwrap_or(&now), tz),
            placeholder: pending && idx + 1 == conversation.len() && msg.is_placeholder(),
        })
        .collect();

    ConversationView {
        scroll_to: messages.len().saturating_sub(1),
        messages,
        pending,
    }
}

pub fn project_local(conversation: &Conversation, pending: bool) -> ConversationView {
    project(conversation, pending, &Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ ChatMessage, DEFAULT_GREETING };
    use chrono::FixedOffset;

    #[test]
    fn times_are_zero_padded_24_hour_in_zone() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 22, 5, 0).unwrap();
        assert_eq!(format_time(&ts, &Utc), "22:05");

        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(format_time(&ts, &plus_three), "01:05");
    }

    #[test]
    fn projects_roles_content_and_scroll_anchor() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut conv = Conversation::seeded(DEFAULT_GREETING, t0);
        conv.begin_exchange(ChatMessage::user("Hello", t0), t0);

        let view = project(&conv, true, &Utc);
        assert_eq!(view.messages.len(), 3);
        assert_eq!(view.scroll_to, 2);
        assert_eq!(view.messages[0].author, "System");
        assert_eq!(view.messages[1].author, "User");
        assert_eq!(view.messages[1].content, "Hello");
        assert_eq!(view.messages[1].time, "08:00");
        assert!(view.messages[2].placeholder);
        assert!(!view.messages[1].placeholder);
    }

    #[test]
    fn trailing_placeholder_is_plain_text_when_idle() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut conv = Conversation::seeded(DEFAULT_GREETING, t0);
        conv.begin_exchange(ChatMessage::user("Hello", t0), t0);

        let view = project(&conv, false, &Utc);
        assert!(!view.messages[2].placeholder);
    }
}
