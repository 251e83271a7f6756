//! Styling of the embedding surface

use serde::{Deserialize, Serialize};

const DEFAULT_BACKGROUND: &str = "gray";
const DEFAULT_FLEX: f32 = 1.0;

/// Caller-supplied style overrides for the view
///
/// `border_radius` is accepted for convenience but never reaches the native
/// surface: the compositor cannot clip native page content to rounded
/// corners. Wrap the view in a clipping container instead.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
}

/// Style forwarded to the native surface, with unsupported properties removed
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub background_color: String,
    pub flex: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_string(),
            flex: DEFAULT_FLEX,
            width: None,
            height: None,
        }
    }
}

impl ViewStyle {
    /// Layers the caller's overrides on top of the default style.
    ///
    /// Returns the resolved style and whether a border radius was dropped.
    #[must_use]
    pub fn resolve(&self) -> (ResolvedStyle, bool) {
        let defaults = ResolvedStyle::default();
        let resolved = ResolvedStyle {
            background_color: self
                .background_color
                .clone()
                .unwrap_or(defaults.background_color),
            flex: self.flex.filter(|f| f.is_finite()).unwrap_or(defaults.flex),
            width: self.width.filter(|w| w.is_finite() && *w >= 0.0),
            height: self.height.filter(|h| h.is_finite() && *h >= 0.0),
        };
        let dropped_radius = self.border_radius.is_some_and(|r| r != 0.0);
        (resolved, dropped_radius)
    }
}

impl From<&ResolvedStyle> for ViewStyle {
    fn from(style: &ResolvedStyle) -> Self {
        Self {
            background_color: Some(style.background_color.clone()),
            flex: Some(style.flex),
            width: style.width,
            height: style.height,
            border_radius: None,
        }
    }
}
