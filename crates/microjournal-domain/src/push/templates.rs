use super::message::PushMessage;
use crate::shared::UserId;

/// Post previews longer than this are cut and suffixed with `...`.
pub const NEW_POST_BODY_LIMIT: usize = 100;

pub fn daily_reminder() -> PushMessage {
    PushMessage::new(
        "Time to reflect 📝",
        "You haven't added to your micro journal today. Take a minute for yourself and your loved ones",
    )
    .with_data("type", "daily_reminder")
}

pub fn streak_expiry() -> PushMessage {
    PushMessage::new(
        "🔥 Don't let your streak expire today!",
        "You have less than an hour to post and keep your streak alive, so let's do that now?",
    )
    .with_data("type", "streak_expiry")
}

pub fn new_post(display_name: &str, author: UserId, text: &str) -> PushMessage {
    let body = if text.chars().count() > NEW_POST_BODY_LIMIT {
        let head: String = text.chars().take(NEW_POST_BODY_LIMIT - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    };

    PushMessage::new(format!("{display_name} posted today!"), body)
        .with_data("type", "new_post")
        .with_data("user_id", author.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_keeps_short_text() {
        let msg = new_post("Ana", UserId::new(4), "hello");
        assert_eq!(msg.title, "Ana posted today!");
        assert_eq!(msg.body, "hello");
        assert_eq!(msg.kind(), Some("new_post"));
        assert_eq!(msg.data.get("user_id").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_new_post_truncates_long_text() {
        let text = "x".repeat(150);
        let msg = new_post("Ana", UserId::new(4), &text);
        assert_eq!(msg.body.chars().count(), NEW_POST_BODY_LIMIT);
        assert!(msg.body.ends_with("..."));

        let exact = "y".repeat(NEW_POST_BODY_LIMIT);
        assert_eq!(new_post("Ana", UserId::new(4), &exact).body, exact);
    }

    #[test]
    fn test_reminder_kinds() {
        assert_eq!(daily_reminder().kind(), Some("daily_reminder"));
        assert_eq!(streak_expiry().kind(), Some("streak_expiry"));
    }
}
