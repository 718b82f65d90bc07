//! Visibility conversion
//!
//! The generic filesystem surface knows two visibility states, the remote
//! store knows three upload-time access types. The mapping is lossy in one
//! direction: both `authenticated` and `private` upload types read back as
//! private visibility, and a private asset converted back to an upload
//! type yields the configured private mapping (default `authenticated`),
//! never the remote's own `private` tag. That asymmetry is deliberate and
//! must not be "fixed" silently.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AssetFsError, Result};

/// Filesystem-facing visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = AssetFsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(AssetFsError::InvalidVisibility(other.to_string())),
        }
    }
}

/// Remote access-control tag, assigned at upload time and immutable after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    Upload,
    Authenticated,
    Private,
}

impl UploadType {
    /// Fallback order tried when deleting an asset whose upload type is
    /// unknown.
    pub const DELETE_ORDER: [UploadType; 3] = [
        UploadType::Upload,
        UploadType::Authenticated,
        UploadType::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadType::Upload => "upload",
            UploadType::Authenticated => "authenticated",
            UploadType::Private => "private",
        }
    }
}

impl fmt::Display for UploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadType {
    type Err = AssetFsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upload" => Ok(UploadType::Upload),
            "authenticated" => Ok(UploadType::Authenticated),
            "private" => Ok(UploadType::Private),
            other => Err(AssetFsError::InvalidVisibility(other.to_string())),
        }
    }
}

/// Bidirectional visibility/upload-type converter.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityConverter {
    private_upload_type: UploadType,
}

impl Default for VisibilityConverter {
    fn default() -> Self {
        Self {
            private_upload_type: UploadType::Authenticated,
        }
    }
}

impl VisibilityConverter {
    /// Build a converter mapping private visibility to the given upload
    /// type. `Upload` is rejected: it would make private assets public.
    pub fn new(private_upload_type: UploadType) -> Result<Self> {
        if private_upload_type == UploadType::Upload {
            return Err(AssetFsError::InvalidVisibility(
                "private visibility cannot map to the upload access type".to_string(),
            ));
        }
        Ok(Self {
            private_upload_type,
        })
    }

    pub fn to_upload_type(&self, visibility: Visibility) -> UploadType {
        match visibility {
            Visibility::Public => UploadType::Upload,
            Visibility::Private => self.private_upload_type,
        }
    }

    pub fn to_visibility(&self, upload_type: UploadType) -> Visibility {
        match upload_type {
            UploadType::Upload => Visibility::Public,
            UploadType::Authenticated | UploadType::Private => Visibility::Private,
        }
    }

    pub fn default_upload_type(&self) -> UploadType {
        self.to_upload_type(self.default_visibility())
    }

    pub fn default_visibility(&self) -> Visibility {
        Visibility::Public
    }
}
