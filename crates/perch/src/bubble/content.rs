//! What a bubble displays.

/// Text shown in a bubble, plus the route of the page that renders it.
///
/// The overlay never renders bubble content itself; it hands the window a
/// content reference of the form `<route>?text=<text>&id=<id>`.
///
/// ```
/// use perch::BubbleContent;
///
/// let content = BubbleContent::new("hi there & bye");
/// assert_eq!(
///     content.to_url("chat-bubble.html", "b1"),
///     "chat-bubble.html?text=hi+there+%26+bye&id=b1"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BubbleContent {
    text: String,
}

impl BubbleContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Content reference for the bubble `id` rendered by `route`.
    pub fn to_url(&self, route: &str, id: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("text", &self.text)
            .append_pair("id", id)
            .finish();
        format!("{route}?{query}")
    }
}

impl From<&str> for BubbleContent {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for BubbleContent {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_text_and_id() {
        let content = BubbleContent::new("a=b?c");
        assert_eq!(
            content.to_url("/chat-bubble.html", "x y"),
            "/chat-bubble.html?text=a%3Db%3Fc&id=x+y"
        );
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(BubbleContent::default().to_url("r", "b"), "r?text=&id=b");
    }

    #[test]
    fn test_unicode_round_trips_through_query_parser() {
        let content = BubbleContent::from("héllo 🦆");
        let url = content.to_url("r", "b");
        let query = url.split_once('?').unwrap().1;
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(pairs[0], ("text".to_string(), "héllo 🦆".to_string()));
    }
}
