//! Retrieval locators
//!
//! A locator has the shape `{base}/o/{percent-encoded object path}?alt=media`.
//! Deletion needs the object path back, so parsing is strict: anything that
//! does not match the shape is refused rather than guessed at. Deleting also
//! requires the locator to sit under the store's own base URL
//! ([`AssetLocator::parse_under`]).

use lx_core::error::ErrorKind;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;
use url::Url;

/// Everything but `[A-Za-z0-9._-]` is escaped, including `/`
const OBJECT_PATH: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'_').remove(b'-');

const OBJECT_SEGMENT: &str = "/o/";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferenceParseError {
    #[error("invalid reference: {locator:?} is not a URL")]
    NotAUrl { locator: String },
    #[error("invalid reference: {locator:?} does not name a stored object")]
    MissingObjectPath { locator: String },
    #[error("invalid reference: {locator:?} has a malformed object path")]
    MalformedObjectPath { locator: String },
    #[error("invalid reference: {locator:?} is not a media link")]
    NotMediaLink { locator: String },
    #[error("invalid reference: {locator:?} is not served from {base_url}")]
    ForeignLocator { locator: String, base_url: String },
}

impl ReferenceParseError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ReferenceParse
    }
}

/// Build and parse retrieval locators
pub struct AssetLocator;

impl AssetLocator {
    /// Locator for an object path under a public base URL
    pub fn format(base_url: &str, object_path: &str) -> String {
        format!(
            "{}{}{}?alt=media",
            base_url.trim_end_matches('/'),
            OBJECT_SEGMENT,
            utf8_percent_encode(object_path, OBJECT_PATH)
        )
    }

    /// Recover the storage path from a locator
    pub fn parse(locator: &str) -> Result<String, ReferenceParseError> {
        let url = Url::parse(locator).map_err(|_| ReferenceParseError::NotAUrl {
            locator: locator.to_string(),
        })?;

        let encoded = url
            .path()
            .rsplit_once(OBJECT_SEGMENT)
            .map(|(_, encoded)| encoded)
            .filter(|encoded| !encoded.is_empty())
            .ok_or_else(|| ReferenceParseError::MissingObjectPath {
                locator: locator.to_string(),
            })?;

        let path = percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|_| ReferenceParseError::MalformedObjectPath {
                locator: locator.to_string(),
            })?
            .into_owned();

        if path.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(ReferenceParseError::MalformedObjectPath {
                locator: locator.to_string(),
            });
        }

        if !url.query_pairs().any(|(key, value)| key == "alt" && value == "media") {
            return Err(ReferenceParseError::NotMediaLink {
                locator: locator.to_string(),
            });
        }

        Ok(path)
    }

    /// Like [`parse`](Self::parse), but the locator must also be one that
    /// `format(base_url, path)` produces: same origin and same path.
    pub fn parse_under(base_url: &str, locator: &str) -> Result<String, ReferenceParseError> {
        let path = Self::parse(locator)?;

        let foreign = || ReferenceParseError::ForeignLocator {
            locator: locator.to_string(),
            base_url: base_url.to_string(),
        };
        let expected = Url::parse(&Self::format(base_url, &path)).map_err(|_| foreign())?;
        let actual = Url::parse(locator).map_err(|_| foreign())?;

        if actual.origin() != expected.origin() || actual.path() != expected.path() {
            return Err(foreign());
        }
        Ok(path)
    }
}
