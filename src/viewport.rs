//! Drawing surface dimensions.
//!
//! The window reports physical pixels and a device pixel ratio. The viewer
//! keeps the logical size for the camera aspect and renders at
//! `logical * min(device_pixel_ratio, max_pixel_ratio)` so high density
//! displays do not pay for more than twice the logical resolution.

use winit::dpi::PhysicalSize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// Ratio reported by the platform.
    pub device_pixel_ratio: f64,
    /// Ratio the drawing surface is rendered at.
    pub pixel_ratio: f64,
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f64, max: f64) -> f64 {
    device_pixel_ratio.min(max)
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio, max_pixel_ratio),
        }
    }

    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64, max_pixel_ratio: f64) -> Self {
        let logical = size.to_logical::<f64>(scale_factor);
        Self::new(logical.width, logical.height, scale_factor, max_pixel_ratio)
    }

    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            return 1.0;
        }
        (self.width / self.height) as f32
    }

    /// Size of the surface that is rendered to, never zero.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let scale = |v: f64| ((v * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Height of the space pointer events are reported in.
    pub fn pointer_height(&self) -> f32 {
        (self.height * self.device_pixel_ratio) as f32
    }
}
