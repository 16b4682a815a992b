use image::RgbaImage;

use crate::{
    config,
    types::{Bounds, Rgb, Vec2},
};

const FILL_GLYPH: char = '█';
const DOT_GLYPH: char = '●';

/// Drawing target the simulation renders into. Reports its size in canvas pixels.
pub trait Surface {
    fn bounds(&self) -> Bounds;
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb);
    fn draw_image(&mut self, image: &RgbaImage, center: Vec2, size: Vec2);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Option<Rgb>,
}

impl RenderCell {
    const BLANK: RenderCell = RenderCell {
        ch: ' ',
        fg: Rgb::WHITE,
        bg: None,
    };
}

/// Terminal cell grid. Each cell covers `CELL_PX_W` x `CELL_PX_H` canvas pixels.
#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(len, RenderCell::BLANK);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(RenderCell::BLANK);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        self.cells[self.index(x, y)]
    }

    fn index(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    fn cell_at(&self, pos: Vec2) -> Option<(u16, u16)> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let x = (pos.x / config::CELL_PX_W).floor();
        let y = (pos.y / config::CELL_PX_H).floor();
        if x >= self.width as f32 || y >= self.height as f32 {
            return None;
        }
        Some((x as u16, y as u16))
    }

    fn set_glyph(&mut self, x: u16, y: u16, ch: char, fg: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        let cell = &mut self.cells[idx];
        cell.ch = ch;
        cell.fg = fg;
    }

    fn set_bg(&mut self, x: u16, y: u16, bg: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        self.cells[idx].bg = Some(bg);
    }

    /// Inclusive cell span covering `[lo, hi]` pixels on one axis, clipped to `cells`.
    fn span(lo: f32, hi: f32, cell_px: f32, cells: u16) -> Option<(u16, u16)> {
        if cells == 0 {
            return None;
        }
        let first = (lo / cell_px).floor().max(0.0);
        let last = (hi / cell_px).floor().min(cells as f32 - 1.0);
        if first > last {
            return None;
        }
        Some((first as u16, last as u16))
    }
}

impl Surface for FrameBuffer {
    fn bounds(&self) -> Bounds {
        Bounds::new(
            self.width as f32 * config::CELL_PX_W,
            self.height as f32 * config::CELL_PX_H,
        )
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb) {
        let r_sq = radius * radius;
        let mut covered = false;
        let cols = Self::span(center.x - radius, center.x + radius, config::CELL_PX_W, self.width);
        let rows = Self::span(center.y - radius, center.y + radius, config::CELL_PX_H, self.height);
        if let (Some((x0, x1)), Some((y0, y1))) = (cols, rows) {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    if (cell_center(x, y) - center).length_sq() < r_sq {
                        self.set_glyph(x, y, FILL_GLYPH, color);
                        covered = true;
                    }
                }
            }
        }
        if !covered {
            if let Some((x, y)) = self.cell_at(center) {
                self.set_glyph(x, y, DOT_GLYPH, color);
            }
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, center: Vec2, size: Vec2) {
        if image.width() == 0 || image.height() == 0 || size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        let left = center.x - size.x / 2.0;
        let top = center.y - size.y / 2.0;
        let cols = Self::span(left, left + size.x, config::CELL_PX_W, self.width);
        let rows = Self::span(top, top + size.y, config::CELL_PX_H, self.height);
        let (Some((x0, x1)), Some((y0, y1))) = (cols, rows) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = cell_center(x, y);
                let u = (p.x - left) / size.x;
                let v = (p.y - top) / size.y;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let px = ((u * image.width() as f32) as u32).min(image.width() - 1);
                let py = ((v * image.height() as f32) as u32).min(image.height() - 1);
                let [r, g, b, a] = image.get_pixel(px, py).0;
                if a > 0 {
                    self.set_bg(x, y, Rgb::new(r, g, b));
                }
            }
        }
    }
}

/// Canvas-pixel position of the center of a cell.
pub fn cell_center(x: u16, y: u16) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) * config::CELL_PX_W,
        (y as f32 + 0.5) * config::CELL_PX_H,
    )
}
