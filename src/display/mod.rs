//! Pixel display surface with a small retained scene graph.
//!
//! A [`Display`] owns a root list of groups, each anchored at a pixel inside
//! the surface. Groups hold [`TextNode`]s. Nothing reaches the pixels until
//! [`Display::render`] rasterizes the graph into the [`Framebuffer`], so any
//! number of graph edits between two renders show up as a single change.

mod framebuffer;
mod text;

pub use framebuffer::Framebuffer;
pub use text::{BLACK, TextNode, TextNodeId, WHITE, create_text};

use embedded_graphics::Drawable;
use embedded_graphics::geometry::{Dimensions, Point};
use embedded_graphics::mono_font::{MonoTextStyleBuilder, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::text::{Baseline, Text, TextStyleBuilder};
use embedded_graphics::transform::Transform;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("group anchor ({x}, {y}) is outside [0, {width}) x [0, {height})")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("group handle does not belong to this display")]
    UnknownGroup,
    #[error("text node is not attached to this group")]
    UnknownNode,
}

/// Refers to a group created by [`Display::create_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(usize);

#[derive(Debug)]
struct Group {
    x: i32,
    y: i32,
    children: Vec<TextNode>,
}

#[derive(Debug)]
pub struct Display {
    width: u32,
    height: u32,
    root: Vec<Group>,
    frame: Framebuffer,
}

impl Display {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            root: Vec::new(),
            frame: Framebuffer::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of groups attached to the root.
    pub fn group_count(&self) -> usize {
        self.root.len()
    }

    /// Adds an empty group anchored at `(x, y)` to the root group.
    ///
    /// The anchor must lie on the surface; on failure the scene graph is left
    /// untouched.
    pub fn create_group(&mut self, x: i32, y: i32) -> Result<GroupHandle, DisplayError> {
        let inside = |v: i32, limit: u32| v >= 0 && (v as u32) < limit;
        if !inside(x, self.width) || !inside(y, self.height) {
            return Err(DisplayError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        self.root.push(Group {
            x,
            y,
            children: Vec::new(),
        });
        debug!(x, y, groups = self.root.len(), "Display group created");
        Ok(GroupHandle(self.root.len() - 1))
    }

    /// Builds a text node. The position is a rendering offset and is not
    /// validated against the surface.
    pub fn create_text_node(
        &self,
        text: impl Into<String>,
        anchor_point: (f32, f32),
        anchored_position: (i32, i32),
        color: u32,
        background_color: u32,
    ) -> TextNode {
        TextNode::new(text, anchor_point, anchored_position, color, background_color)
    }

    pub fn append(&mut self, group: GroupHandle, node: TextNode) -> Result<TextNodeId, DisplayError> {
        let id = node.id();
        self.group_mut(group)?.children.push(node);
        Ok(id)
    }

    /// Detaches a node, returning it if it was attached to `group`.
    pub fn remove(
        &mut self,
        group: GroupHandle,
        id: TextNodeId,
    ) -> Result<Option<TextNode>, DisplayError> {
        let children = &mut self.group_mut(group)?.children;
        Ok(children
            .iter()
            .position(|n| n.id() == id)
            .map(|idx| children.remove(idx)))
    }

    /// Swaps `old` for `node` in place, keeping its position among siblings.
    pub fn replace(
        &mut self,
        group: GroupHandle,
        old: TextNodeId,
        node: TextNode,
    ) -> Result<TextNodeId, DisplayError> {
        let children = &mut self.group_mut(group)?.children;
        let slot = children
            .iter_mut()
            .find(|n| n.id() == old)
            .ok_or(DisplayError::UnknownNode)?;
        let id = node.id();
        *slot = node;
        Ok(id)
    }

    pub fn children(&self, group: GroupHandle) -> Result<&[TextNode], DisplayError> {
        self.root
            .get(group.0)
            .map(|g| g.children.as_slice())
            .ok_or(DisplayError::UnknownGroup)
    }

    /// Rasterizes every group into the framebuffer and returns it.
    pub fn render(&mut self) -> &Framebuffer {
        self.frame.fill(Rgb888::BLACK);

        let text_style = TextStyleBuilder::new().baseline(Baseline::Top).build();
        for group in &self.root {
            for node in &group.children {
                let character_style = MonoTextStyleBuilder::new()
                    .font(&FONT_6X10)
                    .text_color(node.color())
                    .background_color(node.background_color())
                    .build();

                let (ox, oy) = node.anchored_position();
                let origin = Point::new(group.x + ox, group.y + oy);
                let text = Text::with_text_style(node.text(), origin, character_style, text_style);

                let size = text.bounding_box().size;
                let (ax, ay) = node.anchor_point();
                let shift = Point::new(
                    -(ax * size.width as f32).round() as i32,
                    -(ay * size.height as f32).round() as i32,
                );

                if let Err(never) = text.translate(shift).draw(&mut self.frame) {
                    match never {}
                }
            }
        }

        trace!(lit = self.frame.lit_pixels(), "Display rendered");
        &self.frame
    }

    /// The most recently rendered frame.
    pub fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    fn group_mut(&mut self, group: GroupHandle) -> Result<&mut Group, DisplayError> {
        self.root.get_mut(group.0).ok_or(DisplayError::UnknownGroup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_group_bounds() {
        let mut display = Display::new(64, 32);
        assert!(display.create_group(0, 0).is_ok());
        assert!(display.create_group(63, 31).is_ok());

        for (x, y) in [(-1, 0), (64, 0), (0, -1), (0, 32), (100, 100)] {
            let err = display.create_group(x, y).unwrap_err();
            assert_eq!(
                err,
                DisplayError::OutOfBounds {
                    x,
                    y,
                    width: 64,
                    height: 32
                }
            );
        }
        assert_eq!(display.group_count(), 2);
    }

    #[test]
    fn test_text_node_position_not_validated() {
        let display = Display::new(8, 8);
        let node = display.create_text_node("far away", (0.0, 0.0), (500, -500), WHITE, BLACK);
        assert_eq!(node.anchored_position(), (500, -500));
    }

    #[test]
    fn test_append_and_remove() {
        let mut display = Display::new(64, 64);
        let group = display.create_group(0, 0).unwrap();

        let id = display.append(group, create_text("LOADING")).unwrap();
        assert_eq!(display.children(group).unwrap()[0].text(), "LOADING");

        let removed = display.remove(group, id).unwrap().unwrap();
        assert_eq!(removed.text(), "LOADING");
        assert!(display.children(group).unwrap().is_empty());
        assert_eq!(display.remove(group, id).unwrap(), None);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut display = Display::new(64, 64);
        let group = display.create_group(0, 0).unwrap();
        let first = display.append(group, create_text("a")).unwrap();
        display.append(group, create_text("b")).unwrap();

        let new_id = display.replace(group, first, create_text("c")).unwrap();
        let texts: Vec<&str> = display.children(group).unwrap().iter().map(|n| n.text()).collect();
        assert_eq!(texts, vec!["c", "b"]);
        assert_ne!(new_id, first);

        assert_eq!(
            display.replace(group, first, create_text("d")),
            Err(DisplayError::UnknownNode)
        );
    }

    #[test]
    fn test_unknown_group() {
        let mut other = Display::new(8, 8);
        let handle = other.create_group(0, 0).unwrap();
        let mut display = Display::new(8, 8);
        assert_eq!(
            display.append(handle, create_text("x")),
            Err(DisplayError::UnknownGroup)
        );
    }

    #[test]
    fn test_render_lights_pixels_within_surface() {
        let mut display = Display::new(64, 32);
        let group = display.create_group(2, 2).unwrap();
        display.append(group, create_text("HI")).unwrap();

        let frame = display.render();
        assert!(frame.lit_pixels() > 0);
        assert_eq!(frame.pixel(0, 0), Some(Rgb888::BLACK));
        assert_eq!(frame.pixel(40, 20), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_render_reflects_only_latest_text() {
        let mut display = Display::new(64, 32);
        let group = display.create_group(0, 0).unwrap();
        let id = display.append(group, create_text("LOADING")).unwrap();
        let loading = display.render().clone();

        display.replace(group, id, create_text("")).unwrap();
        assert_eq!(display.render().lit_pixels(), 0);
        assert!(loading.lit_pixels() > 0);
    }

    #[test]
    fn test_anchor_point_shifts_text() {
        let mut display = Display::new(64, 32);
        let group = display.create_group(0, 0).unwrap();
        // Bottom-right anchored at (63, 31) keeps the text on screen.
        let node = display.create_text_node("X", (1.0, 1.0), (63, 31), WHITE, BLACK);
        display.append(group, node).unwrap();

        let frame = display.render();
        assert!(frame.lit_pixels() > 0);
        assert_eq!(frame.pixel(0, 0), Some(Rgb888::BLACK));
    }
}
