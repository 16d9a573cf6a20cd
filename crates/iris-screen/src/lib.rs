// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! Screen capture abstraction, per-step observations, and OCR text location.
//!
//! The OS-specific capture primitive is an external collaborator behind the
//! [`ScreenSource`] trait; this crate owns everything downstream of the raw
//! bitmap: PNG decoding, aspect-preserving downscale into grounding space,
//! data-URL encoding for model transport, and the [`TextLocator`] word table.

use std::io::Cursor;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

pub use error::ScreenError;
pub use ocr::{
    clean_ocr_text, render_ocr_table, BBox, OcrElement, StaticOcr, TextLocator, OCR_EDGE_KEEP,
};

mod error;
mod ocr;

// ─── Frames ───────────────────────────────────────────────────────────────────

/// A PNG-encoded bitmap plus its pixel dimensions.
#[derive(Debug, Clone)]
pub struct Frame {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Build a frame from raw PNG bytes, reading the dimensions from the data.
    pub fn from_png(png: Vec<u8>) -> Result<Self, ScreenError> {
        let img = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .map_err(|e| ScreenError::Decode(e.to_string()))?;
        Ok(Self { width: img.width(), height: img.height(), png })
    }

    /// Encode as a data URL (`data:image/png;base64,…`) for model transport.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", B64.encode(&self.png))
    }

    /// Base64 body only (no `data:…;base64,` prefix), for wire shapes that
    /// take the image payload separately.
    pub fn to_base64(&self) -> String {
        B64.encode(&self.png)
    }
}

/// Downscale `frame` to fit within `max_w`×`max_h`, preserving aspect ratio.
/// Never upsamples: a frame already inside the bounds is returned unchanged.
pub fn resize_to_fit(frame: &Frame, max_w: u32, max_h: u32) -> Result<Frame, ScreenError> {
    if frame.width <= max_w && frame.height <= max_h {
        return Ok(frame.clone());
    }
    let img = image::load_from_memory_with_format(&frame.png, image::ImageFormat::Png)
        .map_err(|e| ScreenError::Decode(e.to_string()))?;
    let ratio_w = max_w as f64 / frame.width as f64;
    let ratio_h = max_h as f64 / frame.height as f64;
    let ratio = ratio_w.min(ratio_h);
    let new_w = ((frame.width as f64 * ratio).round() as u32).max(1);
    let new_h = ((frame.height as f64 * ratio).round() as u32).max(1);
    // resize_exact: the dimensions above already preserve aspect ratio, and
    // the grounding canvas cares about exact pixel sizes.
    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| ScreenError::Encode(e.to_string()))?;
    Ok(Frame { png: out.into_inner(), width: resized.width(), height: resized.height() })
}

// ─── Observation ──────────────────────────────────────────────────────────────

/// One step's view of the screen: the raw screenshot plus a copy scaled into
/// the grounding model's canvas.  Immutable for the rest of the step;
/// observations are never reused across steps.
#[derive(Debug, Clone)]
pub struct Observation {
    /// The raw screenshot at native resolution.
    pub screen: Frame,
    /// The screenshot downscaled to fit the grounding canvas.
    pub grounded: Frame,
    /// Declared grounding-canvas width the model emits coordinates in.
    pub canvas_width: u32,
    /// Declared grounding-canvas height.
    pub canvas_height: u32,
}

impl Observation {
    pub fn new(screen: Frame, canvas_width: u32, canvas_height: u32) -> Result<Self, ScreenError> {
        let grounded = resize_to_fit(&screen, canvas_width, canvas_height)?;
        Ok(Self { screen, grounded, canvas_width, canvas_height })
    }

    /// Map a grounding-canvas point onto native screen pixels.
    ///
    /// The scale factor is `screen_dim / canvas_dim` per axis — the canvas is
    /// the model's declared frame, which must be honoured exactly or clicks
    /// miss their targets.
    pub fn to_screen(&self, gx: i32, gy: i32) -> (i32, i32) {
        let sx = self.screen.width as f64 / self.canvas_width as f64;
        let sy = self.screen.height as f64 / self.canvas_height as f64;
        (
            (gx as f64 * sx).round() as i32,
            (gy as f64 * sy).round() as i32,
        )
    }
}

// ─── Screen source ────────────────────────────────────────────────────────────

/// Captures the primary display.  OS backends live outside this workspace;
/// tests use [`SolidColorScreen`].
#[async_trait]
pub trait ScreenSource: Send + Sync {
    async fn capture(&self) -> Result<Frame, ScreenError>;
}

/// Test double: a solid-colour screen of fixed dimensions.
pub struct SolidColorScreen {
    width: u32,
    height: u32,
    rgb: [u8; 3],
}

impl SolidColorScreen {
    pub fn new(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self { width, height, rgb }
    }
}

#[async_trait]
impl ScreenSource for SolidColorScreen {
    async fn capture(&self) -> Result<Frame, ScreenError> {
        let img = image::RgbImage::from_pixel(self.width, self.height, image::Rgb(self.rgb));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| ScreenError::Encode(e.to_string()))?;
        Ok(Frame { png: out.into_inner(), width: self.width, height: self.height })
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn frame(w: u32, h: u32) -> Frame {
        SolidColorScreen::new(w, h, [40, 40, 40]).capture().await.unwrap()
    }

    #[tokio::test]
    async fn capture_reports_requested_dimensions() {
        let f = frame(640, 480).await;
        assert_eq!((f.width, f.height), (640, 480));
        let decoded = Frame::from_png(f.png.clone()).unwrap();
        assert_eq!((decoded.width, decoded.height), (640, 480));
    }

    #[tokio::test]
    async fn resize_preserves_aspect_ratio() {
        let f = frame(1920, 1080).await;
        let small = resize_to_fit(&f, 1000, 1000).unwrap();
        // 1920×1080 → longest side 1000 → 1000×562 (16:9 to the nearest pixel)
        assert_eq!(small.width, 1000);
        assert!((small.height as i32 - 562).abs() <= 1, "got {}", small.height);
    }

    #[tokio::test]
    async fn resize_never_upsamples() {
        let f = frame(320, 200).await;
        let same = resize_to_fit(&f, 1000, 1000).unwrap();
        assert_eq!((same.width, same.height), (320, 200));
        assert_eq!(same.png, f.png);
    }

    #[tokio::test]
    async fn observation_rescales_canvas_point_to_screen() {
        let f = frame(1920, 1080).await;
        let obs = Observation::new(f, 1000, 1000).unwrap();
        let (x, y) = obs.to_screen(500, 500);
        assert!((x - 960).abs() <= 1, "x = {x}");
        assert!((y - 540).abs() <= 1, "y = {y}");
    }

    #[tokio::test]
    async fn observation_corner_points_stay_in_bounds() {
        let f = frame(1920, 1080).await;
        let obs = Observation::new(f, 1000, 1000).unwrap();
        assert_eq!(obs.to_screen(0, 0), (0, 0));
        let (x, y) = obs.to_screen(1000, 1000);
        assert_eq!((x, y), (1920, 1080));
    }

    #[tokio::test]
    async fn data_url_has_png_prefix() {
        let f = frame(4, 4).await;
        assert!(f.to_data_url().starts_with("data:image/png;base64,"));
    }
}
