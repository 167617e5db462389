//! Immutable text nodes attached to display groups.

use std::sync::atomic::{AtomicU64, Ordering};

use embedded_graphics::pixelcolor::Rgb888;

pub const WHITE: u32 = 0xFFFFFF;
pub const BLACK: u32 = 0x000000;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a text node so it can later be detached from its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextNodeId(u64);

/// A string rendered at a fixed anchor. Never mutated after construction;
/// changing what is shown means swapping in a new node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    id: TextNodeId,
    text: String,
    /// Fraction of the text's bounding box pinned to `anchored_position`;
    /// `(0.0, 0.0)` is the top-left corner, `(1.0, 1.0)` the bottom-right.
    anchor_point: (f32, f32),
    /// Pixel offset from the owning group's origin. Not bounds checked.
    anchored_position: (i32, i32),
    color: u32,
    background_color: u32,
}

impl TextNode {
    pub fn new(
        text: impl Into<String>,
        anchor_point: (f32, f32),
        anchored_position: (i32, i32),
        color: u32,
        background_color: u32,
    ) -> Self {
        Self {
            id: TextNodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            text: text.into(),
            anchor_point,
            anchored_position,
            color,
            background_color,
        }
    }

    pub fn id(&self) -> TextNodeId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchor_point(&self) -> (f32, f32) {
        self.anchor_point
    }

    pub fn anchored_position(&self) -> (i32, i32) {
        self.anchored_position
    }

    pub fn color(&self) -> Rgb888 {
        rgb(self.color)
    }

    pub fn background_color(&self) -> Rgb888 {
        rgb(self.background_color)
    }
}

/// White text on black, anchored top-left at the group origin.
pub fn create_text(text: impl Into<String>) -> TextNode {
    TextNode::new(text, (0.0, 0.0), (0, 0), WHITE, BLACK)
}

/// Reads `0xRRGGBB`; bits above the low 24 are ignored.
fn rgb(hex: u32) -> Rgb888 {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as u8;
    Rgb888::new(channel(16), channel(8), channel(0))
}
