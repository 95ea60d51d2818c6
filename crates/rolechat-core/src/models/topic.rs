use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 80;
const UNTITLED: &str = "Untitled";

/// A conversation thread owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds, bumped on every appended message
    pub updated_at: i64,
}

impl Topic {
    pub fn new(id: u64, user_id: u64, title: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id,
            user_id,
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: u64) -> bool {
        self.user_id == user_id
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis().max(self.updated_at);
    }
}

/// Title for a topic created from its first message.
///
/// Trims the text, folds newlines into spaces and keeps at most 80 characters.
pub fn derive_title(text: &str) -> String {
    let flattened = text.trim().replace("\r\n", " ").replace('\n', " ");
    let title: String = flattened.chars().take(TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_flattens_and_truncates() {
        assert_eq!(derive_title("  hello\nworld  "), "hello world");
        assert_eq!(derive_title("   "), "Untitled");

        let long = "魔".repeat(100);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 80);
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut topic = Topic::new(1, 7, "t");
        topic.updated_at = i64::MAX;
        topic.touch();
        assert_eq!(topic.updated_at, i64::MAX);
        assert!(topic.is_owned_by(7));
        assert!(!topic.is_owned_by(8));
    }
}
