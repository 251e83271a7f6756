//! Caller-facing configuration and its normalization
//!
//! `normalize` is a pure function: every optional field gets its documented
//! default and out-of-range numbers are clamped instead of failing, since a
//! render pass must never error on caller input.

use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use super::params::{ResolvedParameters, SourceLocator, StructuralParameters};
use super::style::{ResolvedStyle, ViewStyle};
use super::{
    DEFAULT_DISTANCE_BETWEEN_PAGES, DEFAULT_MAX_PAGE_RESOLUTION, DEFAULT_MAX_ZOOM,
    MIN_PAGE_RESOLUTION, MIN_ZOOM,
};

/// Configuration supplied by the caller on every render
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfiguration {
    /// Local document locator; `None` means no document yet
    pub source: Option<String>,
    pub distance_between_pages: Option<f32>,
    pub max_zoom: Option<f32>,
    pub max_page_resolution: Option<f32>,
    /// Render only the first page, without scrolling
    pub single_page: Option<bool>,
    pub style: ViewStyle,
    pub test_id: Option<String>,
}

impl ViewConfiguration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_single_page(mut self, single_page: bool) -> Self {
        self.single_page = Some(single_page);
        self
    }

    #[must_use]
    pub fn with_max_zoom(mut self, max_zoom: f32) -> Self {
        self.max_zoom = Some(max_zoom);
        self
    }

    #[must_use]
    pub fn with_distance_between_pages(mut self, distance: f32) -> Self {
        self.distance_between_pages = Some(distance);
        self
    }

    #[must_use]
    pub fn with_max_page_resolution(mut self, resolution: f32) -> Self {
        self.max_page_resolution = Some(resolution);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ViewStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_test_id(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = Some(test_id.into());
        self
    }

    /// Fills every unset field from `fallback`
    #[must_use]
    pub fn or(self, fallback: &ViewConfiguration) -> Self {
        let style = if self.style == ViewStyle::default() {
            fallback.style.clone()
        } else {
            self.style
        };

        Self {
            source: self.source.or_else(|| fallback.source.clone()),
            distance_between_pages: self
                .distance_between_pages
                .or(fallback.distance_between_pages),
            max_zoom: self.max_zoom.or(fallback.max_zoom),
            max_page_resolution: self.max_page_resolution.or(fallback.max_page_resolution),
            single_page: self.single_page.or(fallback.single_page),
            style,
            test_id: self.test_id.or_else(|| fallback.test_id.clone()),
        }
    }
}

/// Constraints of the native surface the caller should know about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limitation {
    /// Rounded corners were requested but cannot be honored natively
    BorderRadiusUnsupported,
}

/// Fully resolved configuration, split into live and structural parts
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfiguration {
    pub params: ResolvedParameters,
    pub structural: StructuralParameters,
    pub style: ResolvedStyle,
    pub test_id: Option<String>,
    pub limitations: Vec<Limitation>,
}

impl ResolvedConfiguration {
    /// The same configuration with every field set explicitly
    #[must_use]
    pub fn to_configuration(&self) -> ViewConfiguration {
        ViewConfiguration {
            source: self.params.source.as_ref().map(ToString::to_string),
            distance_between_pages: Some(self.structural.distance_between_pages),
            max_zoom: Some(self.params.max_zoom),
            max_page_resolution: Some(self.structural.max_page_resolution),
            single_page: Some(self.params.single_page),
            style: ViewStyle::from(&self.style),
            test_id: self.test_id.clone(),
        }
    }
}

/// Resolve defaults and clamp out-of-range values
#[must_use]
pub fn normalize(config: &ViewConfiguration) -> ResolvedConfiguration {
    let source = config.source.as_deref().and_then(resolve_source);

    let max_zoom = clamp_to_floor(config.max_zoom, DEFAULT_MAX_ZOOM, MIN_ZOOM, "max_zoom");
    let distance_between_pages = clamp_to_floor(
        config.distance_between_pages,
        DEFAULT_DISTANCE_BETWEEN_PAGES,
        0.0,
        "distance_between_pages",
    );
    let max_page_resolution = clamp_to_floor(
        config.max_page_resolution,
        DEFAULT_MAX_PAGE_RESOLUTION,
        MIN_PAGE_RESOLUTION,
        "max_page_resolution",
    );

    let (style, dropped_radius) = config.style.resolve();
    let mut limitations = Vec::new();
    if dropped_radius {
        warn!("border_radius is not supported by the native page surface and was ignored");
        limitations.push(Limitation::BorderRadiusUnsupported);
    }

    ResolvedConfiguration {
        params: ResolvedParameters {
            source,
            single_page: config.single_page.unwrap_or(false),
            max_zoom,
        },
        structural: StructuralParameters {
            distance_between_pages,
            max_page_resolution,
        },
        style,
        test_id: config.test_id.clone(),
        limitations,
    }
}

fn resolve_source(raw: &str) -> Option<SourceLocator> {
    match SourceLocator::parse(raw) {
        Ok(source) => Some(source),
        Err(e) => {
            warn!("Ignoring document source: {e}");
            None
        }
    }
}

fn clamp_to_floor(value: Option<f32>, default: f32, floor: f32, name: &str) -> f32 {
    let Some(value) = value else {
        return default;
    };

    if !value.is_finite() {
        warn!("{name} is not a finite number ({value}), using default {default}");
        return default;
    }

    if value < floor {
        warn!("{name} {value} is below {floor}, clamping");
        return floor;
    }

    value
}

/// Keeps `ResolvedParameters` referentially stable across renders
///
/// Hands back the previously issued `Arc` while the fields are unchanged, so
/// consumers can skip work with a pointer comparison.
#[derive(Debug, Default)]
pub struct ParamsMemo {
    current: Option<Arc<ResolvedParameters>>,
}

impl ParamsMemo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, params: ResolvedParameters) -> Arc<ResolvedParameters> {
        if let Some(current) = &self.current {
            if **current == params {
                return Arc::clone(current);
            }
        }

        let fresh = Arc::new(params);
        self.current = Some(Arc::clone(&fresh));
        fresh
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
