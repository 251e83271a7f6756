//! Parameter records handed to the native surface

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::SourceError;

/// Version tag carried by every native parameter blob
pub const NATIVE_PARAMS_VERSION: u32 = 1;

const FILE_SCHEME: &str = "file://";

/// Locator of a document already resolved to local, randomly readable storage
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceLocator(String);

impl SourceLocator {
    /// Accepts bare paths and `file://` URIs; anything with another scheme
    /// is remote and has to go through document acquisition first.
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SourceError::Empty);
        }

        // a "://" after a path separator is part of a local file name
        if let Some((scheme, _)) = trimmed.split_once("://") {
            if !scheme.contains('/') && !scheme.eq_ignore_ascii_case("file") {
                return Err(SourceError::Remote {
                    locator: trimmed.to_string(),
                });
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem path with the `file://` prefix removed
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        let path = match self.0.get(..FILE_SCHEME.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(FILE_SCHEME) => {
                &self.0[FILE_SCHEME.len()..]
            }
            _ => self.0.as_str(),
        };
        PathBuf::from(path)
    }

    /// True when both locators name the same file, in either form
    #[must_use]
    pub fn same_document(&self, other: &Self) -> bool {
        self.local_path() == other.local_path()
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SourceLocator {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SourceLocator> for String {
    fn from(value: SourceLocator) -> Self {
        value.0
    }
}

/// Live parameters, re-sent as one record whenever any field changes
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedParameters {
    pub source: Option<SourceLocator>,
    pub single_page: bool,
    pub max_zoom: f32,
}

impl ResolvedParameters {
    /// Opaque blob in the shape native layers consume
    #[must_use]
    pub fn to_native_blob(&self) -> serde_json::Value {
        serde_json::json!({
            "version": NATIVE_PARAMS_VERSION,
            "source": self.source.as_ref().map(SourceLocator::as_str),
            "singlePage": self.single_page,
            "maxZoom": self.max_zoom,
        })
    }

    /// True when `other` points the surface at a different document
    #[must_use]
    pub fn source_differs(&self, other: &Self) -> bool {
        match (&self.source, &other.source) {
            (Some(current), Some(next)) => !current.same_document(next),
            (None, None) => false,
            _ => true,
        }
    }
}

/// Layout values consumed only when the native surface is created
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructuralParameters {
    /// Spacing between pages in density-independent units
    pub distance_between_pages: f32,
    /// Pixel ceiling for page bitmaps while zooming
    pub max_page_resolution: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_file_uris_and_bare_paths() {
        let uri = SourceLocator::parse("file:///data/a.pdf").unwrap();
        assert_eq!(uri.local_path(), PathBuf::from("/data/a.pdf"));

        let bare = SourceLocator::parse("  /data/b.pdf ").unwrap();
        assert_eq!(bare.as_str(), "/data/b.pdf");
        assert_eq!(bare.local_path(), PathBuf::from("/data/b.pdf"));
    }

    #[test]
    fn parse_rejects_remote_and_empty_locators() {
        assert_eq!(SourceLocator::parse("   "), Err(SourceError::Empty));
        assert!(matches!(
            SourceLocator::parse("https://example.com/a.pdf"),
            Err(SourceError::Remote { .. })
        ));
    }

    #[test]
    fn native_blob_carries_the_full_record() {
        let params = ResolvedParameters {
            source: Some(SourceLocator::parse("file:///a.pdf").unwrap()),
            single_page: true,
            max_zoom: 5.0,
        };

        let blob = params.to_native_blob();
        assert_eq!(blob["version"], NATIVE_PARAMS_VERSION);
        assert_eq!(blob["source"], "file:///a.pdf");
        assert_eq!(blob["singlePage"], true);
        assert_eq!(blob["maxZoom"], 5.0);
    }

    #[test]
    fn separator_inside_a_path_is_not_a_scheme() {
        let odd = SourceLocator::parse("/tmp/a://b.pdf").unwrap();
        assert_eq!(odd.local_path(), PathBuf::from("/tmp/a://b.pdf"));
    }

    #[test]
    fn uri_and_bare_path_name_the_same_document() {
        let uri = SourceLocator::parse("file:///data/a.pdf").unwrap();
        let bare = SourceLocator::parse("/data/a.pdf").unwrap();
        assert!(uri.same_document(&bare));

        let with = |source: &SourceLocator| ResolvedParameters {
            source: Some(source.clone()),
            single_page: false,
            max_zoom: 5.0,
        };
        assert!(!with(&uri).source_differs(&with(&bare)));
        assert!(with(&uri).source_differs(&ResolvedParameters {
            source: None,
            ..with(&uri)
        }));
    }
}
