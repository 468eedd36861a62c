// Stacked preview for one album cell
// Cascades the album's preview images diagonally; empty albums get a
// static placeholder texture.

use std::sync::OnceLock;

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::{gdk, glib, Align, ContentFit, Fixed, Image, Overlay, Picture};

use crate::models::Thumbnail;

/// Each stacked layer is shifted by this ratio of the tile's shorter side.
pub const STACK_OFFSET_RATIO: f64 = 0.2;

/// Edge length of the square preview tile in pixels.
pub const TILE_SIZE: i32 = 200;

/// Position and size of one layer in the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Frames for `count` images cascading inside a `width` x `height` tile.
///
/// Layer i sits at `(i * offset, i * offset)` where `offset` is
/// `STACK_OFFSET_RATIO` of the shorter tile side; every layer is shrunk by
/// the total cascade travel so the last one still fits the tile.
pub fn cascade_layout(count: usize, width: f64, height: f64) -> Vec<CascadeFrame> {
    if count == 0 {
        return Vec::new();
    }
    let offset = width.min(height) * STACK_OFFSET_RATIO;
    let travel = offset * (count - 1) as f64;
    let layer_w = (width - travel).max(1.0);
    let layer_h = (height - travel).max(1.0);

    (0..count)
        .map(|i| CascadeFrame {
            x: i as f64 * offset,
            y: i as f64 * offset,
            width: layer_w,
            height: layer_h,
        })
        .collect()
}

// Placeholder texture for albums with no renderable images - generated
// once and reused.
fn empty_album_texture() -> &'static Texture {
    static PLACEHOLDER: OnceLock<Texture> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        let width: usize = 128;
        let height: usize = 128;
        let mut pixels = vec![0u8; width * height * 4];

        // Background: dark gray (#1a1a1a)
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[0] = 0x1a;
            chunk[1] = 0x1a;
            chunk[2] = 0x1a;
            chunk[3] = 0xff;
        }

        let border_color = [0x55u8, 0x55, 0x55, 0xff];
        let glyph_color = [0x88u8, 0x88, 0x88, 0xff];

        // Photo-frame outline
        let left = 16;
        let right = 112;
        let top = 28;
        let bottom = 100;
        for y in top..=bottom {
            for x in left..=right {
                let is_border = x == left || x == right || y == top || y == bottom;
                if is_border {
                    let idx = (y * width + x) * 4;
                    pixels[idx..idx + 4].copy_from_slice(&border_color);
                }
            }
        }

        // "Mountain" glyph: two diagonal strokes meeting near the base
        let base = bottom - 8;
        let peak_x: usize = 56;
        let peak_y = top + 24;
        for step in 0..(base - peak_y) {
            let y = peak_y + step;
            for x in [peak_x.saturating_sub(step), (peak_x + step).min(right - 2)] {
                if x > left && x < right {
                    let idx = (y * width + x) * 4;
                    pixels[idx..idx + 4].copy_from_slice(&glyph_color);
                }
            }
        }

        // "Sun" glyph: small filled square, top-right of the frame
        for y in (top + 8)..(top + 16) {
            for x in (right - 24)..(right - 16) {
                let idx = (y * width + x) * 4;
                pixels[idx..idx + 4].copy_from_slice(&glyph_color);
            }
        }

        let bytes = glib::Bytes::from_owned(pixels);
        gdk::MemoryTexture::new(
            width as i32,
            height as i32,
            gdk::MemoryFormat::R8g8b8a8,
            &bytes,
            width * 4,
        )
        .upcast()
    })
}

pub(crate) fn texture_from_thumbnail(thumb: &Thumbnail) -> Option<Texture> {
    if thumb.width == 0 || thumb.height == 0 {
        return None;
    }
    let expected = (thumb.width as usize)
        .saturating_mul(thumb.height as usize)
        .saturating_mul(4);
    if thumb.rgba.len() < expected {
        return None;
    }
    let bytes = glib::Bytes::from_owned(thumb.rgba.clone());
    let texture = gdk::MemoryTexture::new(
        thumb.width as i32,
        thumb.height as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &bytes,
        (thumb.width * 4) as usize,
    );
    Some(texture.upcast())
}

/// Stacked preview of an album's first few images plus a selection
/// indicator overlay. Renders the placeholder until thumbnails arrive.
pub struct StackedPreview {
    overlay: Overlay,
    stack: Fixed,
    dim: gtk4::Box,
    checkmark: Image,
}

impl StackedPreview {
    pub fn new() -> Self {
        let stack = Fixed::new();
        stack.set_size_request(TILE_SIZE, TILE_SIZE);

        let dim = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        dim.add_css_class("selection-dim");
        dim.set_visible(false);

        let checkmark = Image::from_icon_name("object-select-symbolic");
        checkmark.add_css_class("selection-check");
        checkmark.set_halign(Align::End);
        checkmark.set_valign(Align::End);
        checkmark.set_margin_end(6);
        checkmark.set_margin_bottom(6);
        checkmark.set_visible(false);

        let overlay = Overlay::new();
        overlay.set_child(Some(&stack));
        overlay.add_overlay(&dim);
        overlay.add_overlay(&checkmark);
        overlay.add_css_class("album-preview");

        let preview = Self {
            overlay,
            stack,
            dim,
            checkmark,
        };
        preview.show_placeholder();
        preview
    }

    pub fn widget(&self) -> &Overlay {
        &self.overlay
    }

    /// Replaces the cascade with the given textures, in fetch-arrival
    /// order. An empty slice renders the placeholder.
    pub fn set_textures(&self, textures: &[Texture]) {
        self.clear_stack();

        if textures.is_empty() {
            self.show_placeholder();
            return;
        }

        let frames = cascade_layout(textures.len(), TILE_SIZE as f64, TILE_SIZE as f64);
        for (texture, frame) in textures.iter().zip(frames) {
            let picture = Picture::for_paintable(texture);
            picture.set_content_fit(ContentFit::Contain);
            picture.set_size_request(frame.width as i32, frame.height as i32);
            self.stack.put(&picture, frame.x, frame.y);
        }
    }

    /// Toggles the dim + checkmark selection indicator.
    pub fn set_selected(&self, selected: bool) {
        self.dim.set_visible(selected);
        self.checkmark.set_visible(selected);
    }

    fn show_placeholder(&self) {
        let picture = Picture::for_paintable(empty_album_texture());
        picture.set_content_fit(ContentFit::Contain);
        picture.set_size_request(TILE_SIZE, TILE_SIZE);
        self.stack.put(&picture, 0.0, 0.0);
    }

    fn clear_stack(&self) {
        while let Some(child) = self.stack.first_child() {
            self.stack.remove(&child);
        }
    }
}

impl Default for StackedPreview {
    fn default() -> Self {
        Self::new()
    }
}
