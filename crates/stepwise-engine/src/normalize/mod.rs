//! Tree Normalizer: platform-specific UI serializations → the uniform
//! `Element` model.
//!
//! Each platform module owns a table-driven role map; native types with
//! no table entry become plain containers instead of failing. Elements
//! come back in document order, which every later stage relies on for
//! deterministic results.

mod android;
mod ios;
mod web;

use stepwise_common::element::Element;
use stepwise_common::platform::Platform;
use thiserror::Error;

/// The input could not be parsed as well-formed markup. Fatal for the
/// invocation: the planner reports it and the caller must not retry.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed {platform} tree: {source}")]
    MalformedXml {
        platform: Platform,
        #[source]
        source: roxmltree::Error,
    },
    #[error("malformed web tree: no element content")]
    EmptyDocument,
}

/// Parse a platform-native serialization into normalized elements.
pub fn normalize(raw: &str, platform: Platform) -> Result<Vec<Element>, NormalizeError> {
    match platform {
        Platform::Ios => ios::parse(raw),
        Platform::Android => android::parse(raw),
        Platform::Web => web::parse(raw),
    }
}
