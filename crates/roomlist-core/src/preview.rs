//! Last-message previews.
//!
//! Renders a [`LatestEvent`] into a short styled line for the room list:
//! sender prefix for group rooms, `* Name body` for emotes, type labels for
//! media. Styling is kept abstract ([`SegmentStyle`]) so the UI decides how
//! strong or emphasised text looks.

use crate::entry::{LatestEvent, MessageContent};

/// Non-breaking space placed after a room-name prefix.
const NBSP: char = '\u{a0}';

/// How a segment is emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStyle {
    /// Regular text.
    Plain,
    /// Bold text (room-name prefixes).
    Strong,
    /// Italic text (labels standing in for content).
    Emphasis,
}

/// A run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Text of the run.
    pub text: String,
    /// Style of the run.
    pub style: SegmentStyle,
}

impl Segment {
    fn new(text: impl Into<String>, style: SegmentStyle) -> Self {
        Self { text: text.into(), style }
    }
}

/// Rendered last message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePreview {
    /// Styled runs, in display order.
    pub segments: Vec<Segment>,
}

impl MessagePreview {
    /// Concatenated text without styling.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Prefix with `**room name:**` and a non-breaking space.
    ///
    /// Used when a space is previewed through one of its child rooms.
    #[must_use]
    pub fn with_room_prefix(mut self, room_name: &str) -> Self {
        let mut segments = vec![
            Segment::new(format!("{room_name}:"), SegmentStyle::Strong),
            Segment::new(NBSP.to_string(), SegmentStyle::Plain),
        ];
        segments.append(&mut self.segments);
        self.segments = segments;
        self
    }

    fn push(&mut self, text: impl Into<String>, style: SegmentStyle) {
        self.segments.push(Segment::new(text, style));
    }
}

/// Render the latest event of a room.
///
/// `prefix_sender` is set for group rooms, where the reader needs to know
/// who spoke. Own messages are attributed to "You".
pub fn render_preview(event: &LatestEvent, prefix_sender: bool) -> MessagePreview {
    let (sender, is_own, content) = match event {
        LatestEvent::Local { sender, content, .. } => (sender, true, content),
        LatestEvent::Remote { sender, is_own, content, .. } => (sender, *is_own, content),
    };

    let mut preview = MessagePreview::default();

    // Emotes and state changes already name their subject.
    match content {
        MessageContent::Emote { body } => {
            preview.push(format!("* {} {body}", sender.name()), SegmentStyle::Plain);
            return preview;
        },
        MessageContent::State { description } => {
            preview.push(description.clone(), SegmentStyle::Plain);
            return preview;
        },
        _ => {},
    }

    if prefix_sender {
        let label = if is_own { "You" } else { sender.name() };
        preview.push(format!("{label}: "), SegmentStyle::Plain);
    }

    match content {
        MessageContent::Text { body } | MessageContent::Notice { body } => {
            preview.push(body.clone(), SegmentStyle::Plain);
        },
        MessageContent::Image { caption } => push_labelled(&mut preview, "Image", caption.as_deref()),
        MessageContent::Video { caption } => push_labelled(&mut preview, "Video", caption.as_deref()),
        MessageContent::Audio => preview.push("Audio", SegmentStyle::Emphasis),
        MessageContent::File { filename } => push_labelled(&mut preview, "File", Some(filename.as_str())),
        MessageContent::Location => preview.push("Shared location", SegmentStyle::Emphasis),
        MessageContent::Poll { question } => push_labelled(&mut preview, "Poll", Some(question.as_str())),
        MessageContent::Redacted => preview.push("Message removed", SegmentStyle::Emphasis),
        MessageContent::Emote { .. } | MessageContent::State { .. } => {},
    }

    preview
}

fn push_labelled(preview: &mut MessagePreview, label: &str, detail: Option<&str>) {
    match detail {
        Some(detail) if !detail.is_empty() => {
            preview.push(format!("{label}: "), SegmentStyle::Emphasis);
            preview.push(detail, SegmentStyle::Plain);
        },
        _ => preview.push(label, SegmentStyle::Emphasis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EventSender;

    fn alice() -> EventSender {
        EventSender { user_id: "@alice:example.org".into(), display_name: Some("Alice".into()) }
    }

    fn remote(content: MessageContent, is_own: bool) -> LatestEvent {
        LatestEvent::Remote { timestamp_ms: 1_000, sender: alice(), is_own, content }
    }

    #[test]
    fn group_rooms_prefix_sender() {
        let event = remote(MessageContent::Text { body: "hi".into() }, false);
        assert_eq!(render_preview(&event, true).plain_text(), "Alice: hi");
        assert_eq!(render_preview(&event, false).plain_text(), "hi");
    }

    #[test]
    fn own_messages_are_attributed_to_you() {
        let event = LatestEvent::Local {
            timestamp_ms: 1_000,
            sender: alice(),
            content: MessageContent::Text { body: "on my way".into() },
            is_sending: true,
        };
        assert_eq!(render_preview(&event, true).plain_text(), "You: on my way");
    }

    #[test]
    fn emotes_name_the_sender_regardless_of_prefixing() {
        let event = remote(MessageContent::Emote { body: "waves".into() }, false);
        assert_eq!(render_preview(&event, false).plain_text(), "* Alice waves");
        assert_eq!(render_preview(&event, true).plain_text(), "* Alice waves");
    }

    #[test]
    fn media_renders_type_label() {
        let event = remote(MessageContent::Image { caption: None }, false);
        let preview = render_preview(&event, false);
        assert_eq!(preview.plain_text(), "Image");
        assert_eq!(preview.segments[0].style, SegmentStyle::Emphasis);

        let event = remote(MessageContent::Image { caption: Some("sunset".into()) }, false);
        assert_eq!(render_preview(&event, false).plain_text(), "Image: sunset");

        let event = remote(MessageContent::Poll { question: "Lunch?".into() }, false);
        assert_eq!(render_preview(&event, true).plain_text(), "Alice: Poll: Lunch?");
    }

    #[test]
    fn room_prefix_is_strong_and_separated() {
        let event = remote(MessageContent::Text { body: "hi".into() }, false);
        let preview = render_preview(&event, false).with_room_prefix("General");

        assert_eq!(preview.plain_text(), "General:\u{a0}hi");
        assert_eq!(preview.segments[0], Segment::new("General:", SegmentStyle::Strong));
    }
}
