//! Remote capability surface
//!
//! The adapter consumes the remote asset-management API through the
//! [`AssetApi`] trait. Authentication, transport, and transport-level
//! retries all live behind this seam; implementations surface absent
//! resources as [`AssetFsError::NotFound`](crate::error::AssetFsError::NotFound)
//! and every other failure as
//! [`AssetFsError::Remote`](crate::error::AssetFsError::Remote).

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::resource::ResourceType;
use crate::visibility::UploadType;

/// Remote-API response shape for a single asset. Read-only from the
/// adapter's perspective.
#[derive(Debug, Clone)]
pub struct AssetDescriptor {
    /// Public identifier within the resource-type namespace. Includes the
    /// folder part; includes the extension only for raw assets.
    pub public_id: String,
    pub resource_type: ResourceType,
    pub upload_type: UploadType,
    /// Delivery format (extension) for image/video assets.
    pub format: Option<String>,
    pub bytes: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    /// HTTPS delivery URL for the asset's bytes.
    pub secure_url: Option<String>,
    /// Caller-selected extra fields, keyed by field name.
    pub extra: Map<String, Value>,
}

impl AssetDescriptor {
    /// The logical remote path: public id plus format extension for
    /// image/video assets (raw ids already carry their extension).
    pub fn remote_path(&self) -> String {
        match (&self.resource_type, &self.format) {
            (ResourceType::Raw, _) | (_, None) => self.public_id.clone(),
            (_, Some(format)) if format.is_empty() => self.public_id.clone(),
            (_, Some(format)) => format!("{}.{}", self.public_id, format),
        }
    }
}

/// Payload handed to the upload call.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// A locally materialized file.
    LocalFile(PathBuf),
    /// An in-memory payload.
    Bytes(Bytes),
}

/// Parameters for an upload.
#[derive(Debug, Clone)]
pub struct UploadParams {
    pub resource_type: ResourceType,
    pub upload_type: UploadType,
    /// Base identifier without the folder part.
    pub public_id: String,
    /// Target folder; empty for the store root.
    pub folder: String,
    pub overwrite: bool,
    pub invalidate: bool,
    pub upload_preset: Option<String>,
    /// Display filename, used for raw assets whose public id keeps the
    /// extension.
    pub filename_override: Option<String>,
    /// Optional-feature and passthrough parameters, forwarded verbatim.
    pub extra: Map<String, Value>,
}

/// Parameters for a rename.
#[derive(Debug, Clone, Copy)]
pub struct RenameParams {
    pub resource_type: ResourceType,
    pub from_type: UploadType,
    pub to_type: UploadType,
    pub overwrite: bool,
    pub invalidate: bool,
}

/// Parameters for a batch delete.
#[derive(Debug, Clone, Copy)]
pub struct DeleteParams {
    pub resource_type: ResourceType,
    pub upload_type: UploadType,
    pub invalidate: bool,
}

/// Per-identifier outcome of a batch delete.
///
/// `NotFound` is not an error: it signals the id does not exist under the
/// attempted upload type and the next type should be tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    NotFound,
    Other(String),
}

impl DeleteStatus {
    pub fn from_remote(status: &str) -> Self {
        match status {
            "deleted" => DeleteStatus::Deleted,
            "not_found" => DeleteStatus::NotFound,
            other => DeleteStatus::Other(other.to_string()),
        }
    }
}

/// Parameters for describing an asset.
#[derive(Debug, Clone, Default)]
pub struct DescribeParams {
    pub resource_type: Option<ResourceType>,
    /// Restrict the lookup to one upload type; `None` matches any.
    pub upload_type: Option<UploadType>,
    /// Extra descriptor fields to include in the response.
    pub extra_fields: Vec<String>,
}

/// A folder reported by the subfolder listing.
#[derive(Debug, Clone)]
pub struct FolderRecord {
    pub name: String,
    /// Full remote path of the folder.
    pub path: String,
}

/// One page of a subfolder listing.
#[derive(Debug, Clone, Default)]
pub struct FolderPage {
    pub folders: Vec<FolderRecord>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// A search request against the remote index.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub expression: String,
    /// Extra fields to include per result.
    pub with_field: Vec<String>,
    pub sort_by: Vec<(String, SortOrder)>,
    pub max_results: u32,
    pub cursor: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub resources: Vec<AssetDescriptor>,
    pub next_cursor: Option<String>,
}

/// Remote client capability surface consumed by the adapter.
#[async_trait]
pub trait AssetApi: Send + Sync {
    /// Upload a payload, creating or replacing the asset.
    async fn upload(&self, source: UploadSource, params: &UploadParams)
        -> Result<AssetDescriptor>;

    /// Rename an asset within its resource-type namespace, optionally
    /// changing its upload type.
    async fn rename_asset(
        &self,
        from_id: &str,
        to_id: &str,
        params: &RenameParams,
    ) -> Result<AssetDescriptor>;

    /// Batch-delete up to 100 identifiers, returning a per-id status map.
    async fn delete_assets(
        &self,
        public_ids: &[String],
        params: &DeleteParams,
    ) -> Result<BTreeMap<String, DeleteStatus>>;

    /// Fetch the descriptor for one asset.
    async fn describe_asset(
        &self,
        public_id: &str,
        params: &DescribeParams,
    ) -> Result<AssetDescriptor>;

    /// List the direct subfolders of a folder path, one page at a time.
    async fn list_subfolders(
        &self,
        path: &str,
        max_results: u32,
        cursor: Option<&str>,
    ) -> Result<FolderPage>;

    /// Create a folder path.
    async fn create_folder(&self, path: &str) -> Result<()>;

    /// Delete an empty folder.
    async fn delete_folder(&self, path: &str) -> Result<()>;

    /// Run a search expression against the remote index.
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_path_appends_format_for_media() {
        let descriptor = AssetDescriptor {
            public_id: "pics/photo".into(),
            resource_type: ResourceType::Image,
            upload_type: UploadType::Upload,
            format: Some("jpg".into()),
            bytes: 10,
            created_at: None,
            etag: None,
            secure_url: None,
            extra: Map::new(),
        };
        assert_eq!(descriptor.remote_path(), "pics/photo.jpg");
    }

    #[test]
    fn test_remote_path_raw_unchanged() {
        let descriptor = AssetDescriptor {
            public_id: "docs/data.bin".into(),
            resource_type: ResourceType::Raw,
            upload_type: UploadType::Upload,
            format: None,
            bytes: 10,
            created_at: None,
            etag: None,
            secure_url: None,
            extra: Map::new(),
        };
        assert_eq!(descriptor.remote_path(), "docs/data.bin");
    }

    #[test]
    fn test_delete_status_parsing() {
        assert_eq!(DeleteStatus::from_remote("deleted"), DeleteStatus::Deleted);
        assert_eq!(DeleteStatus::from_remote("not_found"), DeleteStatus::NotFound);
        assert_eq!(
            DeleteStatus::from_remote("blocked"),
            DeleteStatus::Other("blocked".into())
        );
    }
}
