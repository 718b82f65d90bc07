//! Adapter configuration
//!
//! A validated value object owned by the caller and shared with the
//! adapter via `Arc`. It carries no credentials and no transport settings;
//! those belong to the remote client.

use serde::{Deserialize, Serialize};

use crate::error::{AssetFsError, Result};
use crate::path;

/// Configuration for an [`AssetFsAdapter`](crate::adapter::AssetFsAdapter).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdapterConfig {
    /// Remote path prefix scoping the adapter to a sub-tree. Normalized on
    /// validation; empty means the store root.
    #[serde(default)]
    pub prefix: String,

    /// Default upload preset applied to every upload unless overridden
    /// per call.
    #[serde(default)]
    pub upload_preset: Option<String>,

    /// Extra descriptor fields requested on every describe/search call.
    /// Whatever comes back lands in the descriptor's extra-metadata bag.
    #[serde(default)]
    pub metadata_fields: Vec<String>,
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_upload_preset(mut self, preset: impl Into<String>) -> Self {
        self.upload_preset = Some(preset.into());
        self
    }

    pub fn with_metadata_fields(mut self, fields: Vec<String>) -> Self {
        self.metadata_fields = fields;
        self
    }

    /// Validate and normalize the configuration.
    ///
    /// Runs before any remote call; violations are caller bugs surfaced as
    /// [`AssetFsError::Config`].
    pub fn validate(mut self) -> Result<Self> {
        for segment in self.prefix.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(AssetFsError::Config(format!(
                    "prefix must not contain relative segments: {:?}",
                    self.prefix
                )));
            }
        }
        self.prefix = path::normalize(&self.prefix);

        if let Some(preset) = &self.upload_preset {
            if preset.is_empty() {
                return Err(AssetFsError::Config(
                    "upload_preset must not be empty when set".to_string(),
                ));
            }
        }

        for field in &self.metadata_fields {
            let valid = !field.is_empty()
                && field
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if !valid {
                return Err(AssetFsError::Config(format!(
                    "invalid metadata field name: {field:?}"
                )));
            }
        }

        Ok(self)
    }
}
