//! `#track:<name>` selector extraction.

use regex::Regex;

/// Selector sentinel. Names are 1-32 of `[A-Za-z0-9_-]`.
pub const TRACK_PATTERN: &str = r"#track:([A-Za-z0-9_-]{1,32})";

/// A message with its track selector pulled out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutedMessage {
    pub text: String,
    pub track_name: Option<String>,
}

/// Stateless splitter for incoming text.
#[derive(Clone, Debug)]
pub struct Router {
    pattern: Regex,
}

impl Router {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            pattern: Regex::new(TRACK_PATTERN)?,
        })
    }

    /// Remove every selector and trim; the first selector names the track.
    ///
    /// Text without a selector is returned untouched.
    pub fn route(&self, text: &str) -> RoutedMessage {
        let Some(caps) = self.pattern.captures(text) else {
            return RoutedMessage {
                text: text.to_string(),
                track_name: None,
            };
        };
        let track_name = caps.get(1).map(|m| m.as_str().to_string());
        let cleaned = self.pattern.replace_all(text, "").trim().to_string();
        RoutedMessage {
            text: cleaned,
            track_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(text: &str) -> RoutedMessage {
        Router::new().unwrap().route(text)
    }

    #[test]
    fn test_selector_removed_and_trimmed() {
        let routed = route("#track:work summarize the doc");
        assert_eq!(routed.track_name.as_deref(), Some("work"));
        assert_eq!(routed.text, "summarize the doc");
    }

    #[test]
    fn test_selector_mid_text() {
        let routed = route("please #track:side-project_2 do this");
        assert_eq!(routed.track_name.as_deref(), Some("side-project_2"));
        assert_eq!(routed.text, "please  do this");
    }

    #[test]
    fn test_first_selector_wins_all_removed() {
        let routed = route("#track:a hello #track:b");
        assert_eq!(routed.track_name.as_deref(), Some("a"));
        assert_eq!(routed.text, "hello");
    }

    #[test]
    fn test_no_selector_untouched() {
        let routed = route("  just text  ");
        assert_eq!(routed.track_name, None);
        assert_eq!(routed.text, "  just text  ");
    }

    #[test]
    fn test_selector_only() {
        let routed = route("#track:work");
        assert_eq!(routed.track_name.as_deref(), Some("work"));
        assert_eq!(routed.text, "");
    }

    #[test]
    fn test_name_capped_at_32_chars() {
        let long = "a".repeat(40);
        let routed = route(&format!("#track:{long} hi"));
        assert_eq!(routed.track_name.unwrap().len(), 32);
        assert_eq!(routed.text, format!("{} hi", "a".repeat(8)));
    }

    #[test]
    fn test_empty_name_is_not_a_selector() {
        let routed = route("#track: hi");
        assert_eq!(routed.track_name, None);
        assert_eq!(routed.text, "#track: hi");
    }
}
