use crate::anchor::Anchor;
use crate::time::format_time;
use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

/// Ids starting with this prefix address a stroke bucket, not a comment.
pub const DRAWING_ID_PREFIX: &str = "draw-";
pub const DRAWING_PLACEHOLDER_TEXT: &str = "[Drawing feedback]";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommentKind {
    Plain,
    /// Pin comment bound to a point on the frame.
    Anchor(Anchor),
    /// Feed entry standing in for strokes that have no comment. Never stored.
    SyntheticDrawing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub parent_id: String,
    pub timestamp: u32,
    pub text: String,
    pub display_time: String,
}

impl Reply {
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        timestamp: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            timestamp,
            text: text.into(),
            display_time: format_time(f64::from(timestamp)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CommentWire", into = "CommentWire")]
pub struct Comment {
    pub id: String,
    /// Whole second of video time the comment is attached to.
    pub timestamp: u32,
    pub text: String,
    /// `mm:ss` rendering of `timestamp`, fixed at creation.
    pub display_time: String,
    pub replies: Vec<Reply>,
    pub kind: CommentKind,
}

impl Comment {
    fn with_kind(
        id: impl Into<String>,
        timestamp: u32,
        text: impl Into<String>,
        kind: CommentKind,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            text: text.into(),
            display_time: format_time(f64::from(timestamp)),
            replies: Vec::new(),
            kind,
        }
    }

    pub fn plain(id: impl Into<String>, timestamp: u32, text: impl Into<String>) -> Self {
        Self::with_kind(id, timestamp, text, CommentKind::Plain)
    }

    pub fn anchored(
        id: impl Into<String>,
        timestamp: u32,
        text: impl Into<String>,
        anchor: Anchor,
    ) -> Self {
        Self::with_kind(id, timestamp, text, CommentKind::Anchor(anchor))
    }

    /// Placeholder for a bucket of strokes with no comment at that second.
    /// The id embeds the bucket key so deleting it clears that bucket.
    pub fn drawing_placeholder(bucket_key: &str, second: u32) -> Self {
        Self::with_kind(
            format!("{DRAWING_ID_PREFIX}{bucket_key}"),
            second,
            DRAWING_PLACEHOLDER_TEXT,
            CommentKind::SyntheticDrawing,
        )
    }

    pub fn anchor(&self) -> Option<Anchor> {
        match self.kind {
            CommentKind::Anchor(anchor) => Some(anchor),
            _ => None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.kind, CommentKind::SyntheticDrawing)
    }
}

/// Flat JSON layout shared with previously saved data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentWire {
    id: String,
    timestamp: u32,
    text: String,
    display_time: String,
    #[serde(default)]
    replies: Vec<Reply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_drawing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_anchor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anchor_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anchor_y: Option<f64>,
}

impl TryFrom<CommentWire> for Comment {
    type Error = anyhow::Error;

    fn try_from(wire: CommentWire) -> Result<Self, Self::Error> {
        let drawing = wire.is_drawing.unwrap_or(false);
        let kind = match (wire.anchor_x, wire.anchor_y) {
            (Some(x), Some(y)) => {
                if drawing {
                    bail!("comment {} is both an anchor and a drawing", wire.id);
                }
                let anchor = Anchor::new(x, y)
                    .ok_or_else(|| anyhow!("comment {} has a non-finite anchor", wire.id))?;
                CommentKind::Anchor(anchor)
            }
            (None, None) if wire.is_anchor == Some(true) => {
                bail!("anchor comment {} has no coordinates", wire.id)
            }
            (None, None) if drawing => CommentKind::SyntheticDrawing,
            (None, None) => CommentKind::Plain,
            _ => bail!("comment {} has only one anchor coordinate", wire.id),
        };
        Ok(Self {
            id: wire.id,
            timestamp: wire.timestamp,
            text: wire.text,
            display_time: wire.display_time,
            replies: wire.replies,
            kind,
        })
    }
}

impl From<Comment> for CommentWire {
    fn from(comment: Comment) -> Self {
        let (is_drawing, is_anchor, anchor_x, anchor_y) = match comment.kind {
            CommentKind::Plain => (None, None, None, None),
            CommentKind::Anchor(a) => (None, Some(true), Some(a.x()), Some(a.y())),
            CommentKind::SyntheticDrawing => (Some(true), None, None, None),
        };
        Self {
            id: comment.id,
            timestamp: comment.timestamp,
            text: comment.text,
            display_time: comment.display_time,
            replies: comment.replies,
            is_drawing,
            is_anchor,
            anchor_x,
            anchor_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_shape() {
        let c = Comment::drawing_placeholder("12", 12);
        assert_eq!(c.id, "draw-12");
        assert_eq!(c.text, "[Drawing feedback]");
        assert_eq!(c.display_time, "00:12");
        assert!(c.is_drawing());
        assert!(c.replies.is_empty());
    }

    #[test]
    fn plain_comment_wire_has_no_optional_flags() {
        let c = Comment::plain("1", 75, "nice cut");
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1",
                "timestamp": 75,
                "text": "nice cut",
                "displayTime": "01:15",
                "replies": []
            })
        );
    }

    #[test]
    fn anchor_comment_round_trips() {
        let anchor = Anchor::new(0.25, 0.75).unwrap();
        let mut c = Comment::anchored("2", 3, "here", anchor);
        c.replies.push(Reply::new("3", "2", 4, "agreed"));
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["isAnchor"], json!(true));
        assert_eq!(value["anchorX"], json!(0.25));
        assert_eq!(value["replies"][0]["parentId"], json!("2"));

        let back: Comment = serde_json::from_value(value).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn half_anchor_is_rejected() {
        let value = json!({
            "id": "1", "timestamp": 1, "text": "x", "displayTime": "00:01",
            "replies": [], "anchorX": 0.5
        });
        assert!(serde_json::from_value::<Comment>(value).is_err());
    }

    #[test]
    fn anchor_flag_without_coordinates_is_rejected() {
        let value = json!({
            "id": "1", "timestamp": 1, "text": "x", "displayTime": "00:01",
            "isAnchor": true
        });
        assert!(serde_json::from_value::<Comment>(value).is_err());
    }

    #[test]
    fn missing_replies_default_to_empty() {
        let value = json!({"id": "1", "timestamp": 1, "text": "x", "displayTime": "00:01"});
        let c: Comment = serde_json::from_value(value).unwrap();
        assert!(c.replies.is_empty());
        assert_eq!(c.kind, CommentKind::Plain);
    }
}
