//! Device configuration records
//!
//! These are the shapes stored per device and returned to polling devices.
//! Every value of these types is fully normalized: the only way to build one
//! from untrusted input is [`crate::normalize`], and the only way to attach an
//! `updatedAt` stamp is a [`crate::ConfigStore`] write.

use serde::{Deserialize, Serialize};

/// Inclusive range for `screen.splitRatio` (percent)
pub const SPLIT_RATIO_RANGE: (i64, i64) = (0, 100);

/// Inclusive range for `screen.gapPx` and `screen.paddingPx` (pixels)
pub const PIXEL_RANGE: (i64, i64) = (0, 200);

/// Default `screen.splitRatio`
pub const DEFAULT_SPLIT_RATIO: u8 = 50;

/// How the display area is divided between web and video content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Web and video side by side
    #[default]
    Split,
    /// Web content only
    WebOnly,
    /// Video content only
    VideoOnly,
}

impl Layout {
    /// Parse a wire value, returning `None` for anything unrecognised
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "split" => Some(Layout::Split),
            "web_only" => Some(Layout::WebOnly),
            "video_only" => Some(Layout::VideoOnly),
            _ => None,
        }
    }

    /// The wire value for this layout
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Split => "split",
            Layout::WebOnly => "web_only",
            Layout::VideoOnly => "video_only",
        }
    }
}

/// Direction of the split between the two panes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Panes laid out left to right
    #[default]
    Row,
    /// Panes stacked top to bottom
    Column,
}

/// Screen geometry for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConfig {
    pub orientation: Orientation,
    /// Share of the screen given to the web pane, in percent
    pub split_ratio: u8,
    pub gap_px: u16,
    pub padding_px: u16,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Row,
            split_ratio: DEFAULT_SPLIT_RATIO,
            gap_px: 0,
            padding_px: 0,
        }
    }
}

/// Normalized, not yet stamped, configuration for one device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    /// URL rendered in the web pane (not validated)
    pub web_url: String,
    /// URL played in the video pane (not validated)
    pub video_url: String,
    pub layout: Layout,
    pub screen: ScreenConfig,
}

/// Stored configuration for one device
///
/// Serializes flat, e.g.
///
/// ```json
/// {
///   "webUrl": "https://a",
///   "videoUrl": "https://b",
///   "layout": "split",
///   "screen": { "orientation": "row", "splitRatio": 50, "gapPx": 0, "paddingPx": 0 },
///   "updatedAt": 1760600000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfiguration {
    #[serde(flatten)]
    pub settings: DeviceSettings,
    /// Store write time, seconds since the Unix epoch
    pub updated_at: i64,
}

impl DeviceConfiguration {
    /// Stamp settings with a store write time
    ///
    /// # Visibility
    ///
    /// `pub(crate)` so that only store implementations assign `updatedAt`.
    pub(crate) fn stamped(settings: DeviceSettings, updated_at: i64) -> Self {
        Self {
            settings,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_with_camel_case_wire_names() {
        let record = DeviceConfiguration::stamped(
            DeviceSettings {
                web_url: "https://a".into(),
                video_url: "https://b".into(),
                layout: Layout::VideoOnly,
                screen: ScreenConfig {
                    orientation: Orientation::Column,
                    split_ratio: 30,
                    gap_px: 4,
                    padding_px: 8,
                },
            },
            1_700_000_000,
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "webUrl": "https://a",
                "videoUrl": "https://b",
                "layout": "video_only",
                "screen": {
                    "orientation": "column",
                    "splitRatio": 30,
                    "gapPx": 4,
                    "paddingPx": 8
                },
                "updatedAt": 1_700_000_000
            })
        );
    }

    #[test]
    fn default_screen_matches_documented_defaults() {
        let screen = ScreenConfig::default();
        assert_eq!(screen.orientation, Orientation::Row);
        assert_eq!(screen.split_ratio, 50);
        assert_eq!(screen.gap_px, 0);
        assert_eq!(screen.padding_px, 0);
    }

    #[test]
    fn layout_wire_values() {
        for layout in [Layout::Split, Layout::WebOnly, Layout::VideoOnly] {
            assert_eq!(Layout::from_wire(layout.as_str()), Some(layout));
        }
        assert_eq!(Layout::from_wire("Split"), None);
    }
}
