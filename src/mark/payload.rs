// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/tracemark

//! The identifying payload embedded into every served image.
//!
//! A [`WatermarkPayload`] is constructed fresh for every view — it carries a
//! per-view timestamp and viewer identity, so the calling layer must never
//! cache or reuse a watermarked result across requests.

use core::fmt;

/// Fixed width of the viewer identity field in the serialized frame.
pub const VIEWER_ID_LEN: usize = 28;
/// Fixed width of the screenshot identifier field in the serialized frame.
pub const SCREENSHOT_ID_LEN: usize = 32;

/// The identifying record embedded into an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkPayload {
    /// Viewer identity. Longer values are truncated to [`VIEWER_ID_LEN`]
    /// bytes at a UTF-8 boundary during serialization; identity remains
    /// probabilistically distinguishable after truncation.
    pub viewer_id: String,
    /// View time, milliseconds since the Unix epoch.
    pub view_timestamp: i64,
    /// Identifier of the served asset. Truncated to [`SCREENSHOT_ID_LEN`]
    /// bytes like `viewer_id`.
    pub screenshot_id: String,
}

impl WatermarkPayload {
    /// Construct a payload for one view.
    pub fn new(viewer_id: impl Into<String>, view_timestamp: i64, screenshot_id: impl Into<String>) -> Self {
        Self {
            viewer_id: viewer_id.into(),
            view_timestamp,
            screenshot_id: screenshot_id.into(),
        }
    }
}

/// Fields recovered by a best-effort partial extraction.
///
/// Carried inside `DecodeError::PartialExtraction`: each field is present
/// only if every bit of it sat before the first corrupted bit of the frame.
/// Even one intact field can be a usable forensic lead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialPayload {
    /// Viewer identity, if its field was intact.
    pub viewer_id: Option<String>,
    /// View timestamp, if its field was intact.
    pub view_timestamp: Option<i64>,
    /// Screenshot identifier, if its field was intact.
    pub screenshot_id: Option<String>,
}

impl PartialPayload {
    /// True when no field was recovered.
    pub fn is_empty(&self) -> bool {
        self.viewer_id.is_none() && self.view_timestamp.is_none() && self.screenshot_id.is_none()
    }
}

impl fmt::Display for PartialPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "viewer_id={}, view_timestamp={}, screenshot_id={}",
            self.viewer_id.as_deref().unwrap_or("?"),
            self.view_timestamp.map_or_else(|| "?".to_string(), |t| t.to_string()),
            self.screenshot_id.as_deref().unwrap_or("?"),
        )
    }
}
