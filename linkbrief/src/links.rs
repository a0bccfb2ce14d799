use regex::Regex;
use std::sync::LazyLock;

/// Sender identity as reported by the transport.
pub type SenderId = i64;

/// What a rich entity describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// Hyperlink whose target differs from the displayed text.
    ExplicitLink { target: String },
    /// URL written out in the text itself.
    PlainUrl,
    Other,
}

/// Transport supplied span over the caption text.
/// `offset` and `length` count UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

impl RichEntity {
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self { kind, offset, length }
    }
}

/// One incoming chat message, already stripped of transport specifics.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    pub sender_id: SenderId,
    pub caption: Option<String>,
    pub entities: Vec<RichEntity>,
}

impl InboundMessage {
    pub fn new(sender_id: SenderId, caption: Option<String>) -> Self {
        Self {
            sender_id,
            caption,
            entities: Vec::new(),
        }
    }

    pub fn with_entities(mut self, entities: Vec<RichEntity>) -> Self {
        self.entities = entities;
        self
    }

    /// Caption text, treating an empty caption as absent.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.is_empty())
    }
}

// Trailing punctuation is deliberately kept in the match.
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("bare url regex compiles"));

static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[.*?\]\((https?://.*?)\)").expect("markdown link regex compiles")
});

/// Find the first link in a message.
///
/// Entities are authoritative and checked first: an explicit link anywhere in
/// the entity list beats a plain URL entity, and both beat scanning the text.
/// Text scanning tries a bare `http(s)://` match, then a Markdown `[label](url)`.
pub fn extract_link(caption: Option<&str>, entities: &[RichEntity]) -> Option<String> {
    if let Some(target) = entities.iter().find_map(|e| match &e.kind {
        EntityKind::ExplicitLink { target } => Some(target.clone()),
        _ => None,
    }) {
        return Some(target);
    }

    let text = caption?;

    if let Some(url) = entities
        .iter()
        .filter(|e| e.kind == EntityKind::PlainUrl)
        .find_map(|e| utf16_slice(text, e.offset, e.length))
    {
        return Some(url);
    }

    if let Some(m) = BARE_URL_RE.find(text) {
        return Some(m.as_str().to_string());
    }

    MARKDOWN_LINK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Substring of `text` addressed in UTF-16 code units.
/// Returns `None` for empty or out of range spans and for spans that split a surrogate pair.
fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<String> {
    if length == 0 {
        return None;
    }
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    let span = units.get(offset..end)?;
    String::from_utf16(span).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(target: &str, offset: usize, length: usize) -> RichEntity {
        RichEntity::new(
            EntityKind::ExplicitLink {
                target: target.to_string(),
            },
            offset,
            length,
        )
    }

    #[test]
    fn explicit_link_entity_wins_over_text() {
        let caption = "read https://other.example/x now";
        let entities = vec![
            RichEntity::new(EntityKind::PlainUrl, 5, 23),
            link("https://target.example/story", 0, 4),
        ];

        assert_eq!(
            extract_link(Some(caption), &entities).as_deref(),
            Some("https://target.example/story")
        );
    }

    #[test]
    fn explicit_link_is_returned_without_caption() {
        let entities = vec![link("https://target.example/", 0, 3)];
        assert_eq!(
            extract_link(None, &entities).as_deref(),
            Some("https://target.example/")
        );
    }

    #[test]
    fn plain_url_entity_is_sliced_from_caption() {
        let caption = "see example.com/page for details";
        let entities = vec![
            RichEntity::new(EntityKind::Other, 0, 3),
            RichEntity::new(EntityKind::PlainUrl, 4, 16),
        ];

        assert_eq!(
            extract_link(Some(caption), &entities).as_deref(),
            Some("example.com/page")
        );
    }

    #[test]
    fn plain_url_offsets_count_utf16_units() {
        // The emoji takes two UTF-16 units.
        let caption = "🔥 https://a.example/b";
        let entities = vec![RichEntity::new(EntityKind::PlainUrl, 3, 19)];

        assert_eq!(
            extract_link(Some(caption), &entities).as_deref(),
            Some("https://a.example/b")
        );
    }

    #[test]
    fn out_of_range_entity_falls_back_to_text_scan() {
        let caption = "x https://fallback.example/";
        let entities = vec![RichEntity::new(EntityKind::PlainUrl, 10, 500)];

        assert_eq!(
            extract_link(Some(caption), &entities).as_deref(),
            Some("https://fallback.example/")
        );
    }

    #[test]
    fn first_bare_url_wins() {
        let caption = "look at this https://example.com/a cool story, also http://example.org/b";
        assert_eq!(
            extract_link(Some(caption), &[]).as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn bare_url_keeps_trailing_punctuation() {
        assert_eq!(
            extract_link(Some("go to https://example.com/a."), &[]).as_deref(),
            Some("https://example.com/a.")
        );
        // The bare pattern matches before the Markdown one does.
        assert_eq!(
            extract_link(Some("[story](https://example.com/s)"), &[]).as_deref(),
            Some("https://example.com/s)")
        );
    }

    #[test]
    fn markdown_pattern_captures_url() {
        let caps = MARKDOWN_LINK_RE
            .captures("intro [the story](https://example.com/s) outro")
            .expect("markdown link");
        assert_eq!(&caps[1], "https://example.com/s");
    }

    #[test]
    fn no_link_found() {
        assert_eq!(extract_link(Some("just words here"), &[]), None);
        assert_eq!(extract_link(None, &[]), None);
        assert_eq!(
            extract_link(Some("ftp://example.com/file"), &[RichEntity::new(EntityKind::Other, 0, 3)]),
            None
        );
    }

    #[test]
    fn empty_caption_is_treated_as_absent() {
        let msg = InboundMessage::new(1, Some(String::new()));
        assert_eq!(msg.caption(), None);
        let msg = InboundMessage::new(1, Some("hi".to_string()));
        assert_eq!(msg.caption(), Some("hi"));
    }
}
