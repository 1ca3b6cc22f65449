//! S3 data types

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use url::Url;

/// Everything except RFC 3986 unreserved characters
const KEY_SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An object held by a store together with the content type it was put with
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

/// Public URL template for objects in the bucket.
///
/// The bucket has to be configured for public reads out of band; nothing here
/// checks that the resulting URL actually serves the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicUrl {
    base: Url,
}

impl PublicUrl {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Parse a base such as `https://pub-1234.r2.dev`
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Url::parse(base).map(Self::new)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Build the public URL of `key`.
    ///
    /// Each `/`-separated segment of the key is percent-encoded, so plain keys
    /// like `frog.jpg` are appended verbatim. `.` and `..` segments are encoded
    /// too, otherwise URL normalization would point at a different object.
    pub fn url_for(&self, key: &str) -> String {
        let mut base = self.base.clone();
        base.set_query(None);
        base.set_fragment(None);

        let path = key
            .split('/')
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("/");

        format!("{}/{}", base.as_str().trim_end_matches('/'), path)
    }
}

fn encode_segment(segment: &str) -> String {
    match segment {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => utf8_percent_encode(segment, KEY_SEGMENT_ENCODE_SET).to_string(),
    }
}
