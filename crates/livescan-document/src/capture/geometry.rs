// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Centred crop of a camera frame to a fixed target aspect ratio.

/// A crop rectangle in source-frame coordinates (fractional pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Largest centred rectangle of aspect `target_ratio` (width / height)
    /// that fits inside a `width` x `height` frame.
    ///
    /// A frame wider than the target keeps its full height and loses equal
    /// strips left and right; otherwise it keeps its full width and loses
    /// equal strips top and bottom.
    pub fn centered(width: u32, height: u32, target_ratio: f64) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        let source_ratio = w / h;

        if source_ratio > target_ratio {
            let crop_width = h * target_ratio;
            Self {
                x: (w - crop_width) / 2.0,
                y: 0.0,
                width: crop_width,
                height: h,
            }
        } else {
            let crop_height = w / target_ratio;
            Self {
                x: 0.0,
                y: (h - crop_height) / 2.0,
                width: w,
                height: crop_height,
            }
        }
    }

    /// Snap to whole pixels as `(x, y, width, height)`, clamped so the
    /// region lies inside a `max_width` x `max_height` image and is never
    /// empty.
    pub fn to_pixels(&self, max_width: u32, max_height: u32) -> (u32, u32, u32, u32) {
        let x = (self.x.round().max(0.0) as u32).min(max_width.saturating_sub(1));
        let y = (self.y.round().max(0.0) as u32).min(max_height.saturating_sub(1));
        let width = (self.width.round().max(1.0) as u32).min(max_width - x);
        let height = (self.height.round().max(1.0) as u32).min(max_height - y);
        (x, y, width, height)
    }
}
