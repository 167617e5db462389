//! In-memory RGB888 pixel grid the scene graph is rasterized into.

use core::convert::Infallible;

use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

/// A `width × height` grid of pixels, row-major.
///
/// Pixels drawn outside the grid are silently clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    /// Raw pixels, row by row, for handing to a panel driver.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Rgb888) {
        self.pixels.fill(color);
    }

    /// Number of pixels that are not black.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| **p != Rgb888::BLACK).count()
    }

    /// One character per pixel: `#` lit, `.` dark.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for row in self.pixels.chunks(self.width.max(1) as usize) {
            out.extend(row.iter().map(|p| if *p == Rgb888::BLACK { '.' } else { '#' }));
            out.push('\n');
        }
        out
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.width && y < self.height {
                let idx = self.index(x, y);
                self.pixels[idx] = color;
            }
        }
        Ok(())
    }
}
