//! Message content model and chat segments.
//!
//! [`Content`] is what a caller wants to send or render. The chat service only
//! speaks [`ChatSegment`] lists, so text content is converted into segments
//! (line breaks and links split out) and everything else is rejected as
//! unsupported.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::conversation::core::errors::{ConversationError, ConversationResult};
use crate::conversation::core::ids::ImageId;

/// Stable content type identifiers.
pub mod content_types {
    /// Plain text.
    pub const TEXT: &str = "text";
    /// Rich (attributed) text.
    pub const RICH_TEXT: &str = "rich_text";
    /// Photo.
    pub const IMAGE: &str = "image";
    /// Audio clip.
    pub const AUDIO: &str = "audio";
    /// Video clip.
    pub const VIDEO: &str = "video";
    /// Arbitrary file.
    pub const FILE: &str = "file";
    /// Text above the character limit.
    pub const SNIPPET: &str = "snippet";
    /// Latitude/longitude pair.
    pub const LOCATION: &str = "location";
}

/// Content of a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    /// Plain text.
    Text(String),
    /// Rich text, kept as markup.
    RichText(String),
    /// Photo at a URL.
    Image(String),
    /// Audio at a URL.
    Audio(String),
    /// Video at a URL.
    Video(String),
    /// File at a URL.
    File(String),
    /// Long text.
    Snippet(String),
    /// Coordinates.
    Location(f64, f64),
}

impl Content {
    /// Stable identifier of the content type.
    #[must_use]
    pub const fn type_id(&self) -> &'static str {
        match self {
            Self::Text(_) => content_types::TEXT,
            Self::RichText(_) => content_types::RICH_TEXT,
            Self::Image(_) => content_types::IMAGE,
            Self::Audio(_) => content_types::AUDIO,
            Self::Video(_) => content_types::VIDEO,
            Self::File(_) => content_types::FILE,
            Self::Snippet(_) => content_types::SNIPPET,
            Self::Location(..) => content_types::LOCATION,
        }
    }

    /// Text of a plain text content, empty for anything else.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            _ => "",
        }
    }
}

/// Kind of a chat segment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Text run.
    #[default]
    Text,
    /// Hyperlink.
    Link,
    /// Line break.
    LineBreak,
}

/// Text formatting flags.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formatting {
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Strikethrough.
    pub strikethrough: bool,
    /// Underline.
    pub underline: bool,
}

/// One segment of a chat message.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatSegment {
    /// Segment kind.
    #[serde(default)]
    pub kind: SegmentKind,
    /// Visible text.
    #[serde(default)]
    pub text: String,
    /// Formatting.
    #[serde(default)]
    pub formatting: Formatting,
    /// Target of a link segment.
    #[serde(default)]
    pub link_target: Option<String>,
}

impl ChatSegment {
    /// Plain text segment.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Text,
            text: text.into(),
            ..Self::default()
        }
    }

    /// Line break segment.
    #[must_use]
    pub fn line_break() -> Self {
        Self {
            kind: SegmentKind::LineBreak,
            text: "\n".to_string(),
            ..Self::default()
        }
    }

    /// Link segment; the target gets an `http://` scheme when it has none.
    #[must_use]
    pub fn link(text: impl Into<String>) -> Self {
        let text = text.into();
        let target = normalize_link(&text);
        Self {
            kind: SegmentKind::Link,
            text,
            formatting: Formatting::default(),
            link_target: Some(target),
        }
    }

    /// Split text into segments: one per line, with links broken out.
    #[must_use]
    pub fn parse_text(text: &str) -> Vec<Self> {
        let mut segments = Vec::new();
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                segments.push(Self::line_break());
            }
            push_line(&mut segments, line);
        }
        segments
    }
}

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+[^\s<>.,;:!?)\]]").ok()
        })
        .as_ref()
}

fn push_line(segments: &mut Vec<ChatSegment>, line: &str) {
    let mut cursor = 0;
    let links = link_pattern().into_iter().flat_map(|pattern| pattern.find_iter(line));
    for found in links {
        if found.start() > cursor {
            segments.push(ChatSegment::text(&line[cursor..found.start()]));
        }
        segments.push(ChatSegment::link(found.as_str()));
        cursor = found.end();
    }
    if cursor < line.len() {
        segments.push(ChatSegment::text(&line[cursor..]));
    }
}

fn normalize_link(raw: &str) -> String {
    Url::parse(raw)
        .or_else(|_| Url::parse(&format!("http://{raw}")))
        .map_or_else(|_| raw.to_string(), |url| url.to_string())
}

/// Raw image to upload before sending.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageUpload {
    /// File name reported to the service.
    pub name: String,
    /// Image bytes.
    pub data: Vec<u8>,
}

/// Message about to be sent.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageDraft {
    /// Message body.
    pub segments: Vec<ChatSegment>,
    /// Image to upload first; takes precedence over `image_id`.
    pub image: Option<ImageUpload>,
    /// Already-uploaded image to attach.
    pub image_id: Option<ImageId>,
}

impl MessageDraft {
    /// Text-only draft.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self {
            segments: ChatSegment::parse_text(text),
            ..Self::default()
        }
    }

    /// Build a draft from content.
    ///
    /// # Errors
    /// Returns `UnsupportedContent` for anything but text and snippets.
    pub fn from_content(content: &Content) -> ConversationResult<Self> {
        match content {
            Content::Text(text) | Content::Snippet(text) => Ok(Self::text(text)),
            other => Err(ConversationError::UnsupportedContent(
                other.type_id().to_string(),
            )),
        }
    }

    /// Attach image bytes to upload before sending.
    #[must_use]
    pub fn with_image(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.image = Some(ImageUpload {
            name: name.into(),
            data,
        });
        self
    }

    /// Attach an already-uploaded image.
    #[must_use]
    pub fn with_image_id(mut self, image_id: ImageId) -> Self {
        self.image_id = Some(image_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_splits_lines_and_links() {
        let segments = ChatSegment::parse_text("see www.example.com now\nbye");
        let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Text,
                SegmentKind::Link,
                SegmentKind::Text,
                SegmentKind::LineBreak,
                SegmentKind::Text,
            ]
        );
        assert_eq!(segments[1].text, "www.example.com");
        assert_eq!(
            segments[1].link_target.as_deref(),
            Some("http://www.example.com/")
        );
    }

    #[test]
    fn test_link_with_scheme_is_kept() {
        let segments = ChatSegment::parse_text("https://example.org/a?b=1.");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "https://example.org/a?b=1");
        assert_eq!(segments[1].text, ".");
    }

    #[test]
    fn test_from_content_rejects_media() {
        let err = MessageDraft::from_content(&Content::Image("file:///a.png".to_string()));
        assert!(matches!(err, Err(ConversationError::UnsupportedContent(t)) if t == "image"));

        let draft = MessageDraft::from_content(&Content::Snippet("long".to_string()));
        assert!(draft.is_ok());
    }

    #[test]
    fn test_content_text_accessor() {
        assert_eq!(Content::Text("hi".to_string()).text(), "hi");
        assert_eq!(Content::Location(1.0, 2.0).text(), "");
    }
}
