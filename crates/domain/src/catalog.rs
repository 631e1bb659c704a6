//! Catalog: the static list of endpoints returned on discovery.
//!
//! Descriptors are kept as raw JSON: their schema belongs to the voice
//! assistant and they are returned verbatim.

use std::sync::Arc;

/// Immutable endpoint catalog, cheap to clone and share across requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    endpoints: Arc<[serde_json::Value]>,
}

/// Why a catalog document was rejected.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document is not JSON.
    #[error("failed to parse catalog")]
    Parse(#[from] serde_json::Error),
    /// The document is JSON but not an array of descriptors.
    #[error("catalog must be a JSON array of endpoint descriptors")]
    NotAnArray,
}

impl Catalog {
    /// Build a catalog from already decoded descriptors.
    #[must_use]
    pub fn new(endpoints: Vec<serde_json::Value>) -> Self {
        Self {
            endpoints: endpoints.into(),
        }
    }

    /// Parse a catalog from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the text is not a JSON array.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        match serde_json::from_str(text)? {
            serde_json::Value::Array(endpoints) => Ok(Self::new(endpoints)),
            _ => Err(CatalogError::NotAnArray),
        }
    }

    /// The descriptors, in file order.
    #[must_use]
    pub fn endpoints(&self) -> &[serde_json::Value] {
        &self.endpoints
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
