//! Content-derived identifiers for configurations, datasets and runs.
//!
//! All identifiers are lowercase hex BLAKE3 digests, stable across builds and
//! platforms.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! hex_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn from_bytes(bytes: &[u8]) -> Self {
                Self(blake3::hash(bytes).to_hex().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First 12 hex chars, for log lines and summaries.
            pub fn short(&self) -> &str {
                &self.0[..self.0.len().min(12)]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

hex_id!(
    /// Hash of the canonical JSON of a strategy + engine configuration.
    ConfigHash
);

hex_id!(
    /// Hash of the canonical serialization of a loaded round dataset.
    DatasetHash
);

hex_id!(
    /// Identity of one run: configuration and dataset together.
    RunId
);

impl RunId {
    pub fn derive(config: &ConfigHash, dataset: &DatasetHash) -> Self {
        let canonical = serde_json::json!({
            "config_hash": config.as_str(),
            "dataset_hash": dataset.as_str(),
        });
        Self::from_bytes(canonical.to_string().as_bytes())
    }
}
