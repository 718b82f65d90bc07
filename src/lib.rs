//! assetfs: a filesystem-style adapter over a cloud asset-management API
//!
//! The remote store only partially resembles a filesystem: it has no true
//! empty directories, cannot change access control after upload, partitions
//! every asset into one of three resource-type namespaces (image, video,
//! raw), and lists files and folders through two unrelated, eventually
//! consistent endpoints. This crate reconciles the generic filesystem
//! operation set (write/read/delete/move/copy/list/exists/metadata) with
//! that model.
//!
//! # Architecture
//!
//! - **Remote client** ([`api::AssetApi`]): the opaque capability surface
//!   of the remote API. Authentication, transport and retries live behind
//!   it, out of scope here.
//! - **Path/identifier model** ([`path`]): derives remote public ids from
//!   logical paths and back; recomputed on every operation.
//! - **Classifier** ([`resource`]): maps detected mime types onto the
//!   remote resource-type partition via overridable substring lists.
//! - **Visibility converter** ([`visibility`]): the lossy two-state /
//!   three-state access-control mapping.
//! - **Adapter core** ([`adapter::AssetFsAdapter`]): the reconciliation
//!   engine tying it all together.
//!
//! # Example
//!
//! ```no_run
//! use assetfs::adapter::AssetFsAdapter;
//! use assetfs::config::AdapterConfig;
//! use assetfs::options::WriteOptions;
//!
//! # async fn example(client: impl assetfs::api::AssetApi) -> assetfs::Result<()> {
//! let config = AdapterConfig::new().with_prefix("tenant/media");
//! let adapter = AssetFsAdapter::new(client, config)?;
//!
//! adapter.write("pics/photo.jpg", b"...", &WriteOptions::new()).await?;
//! let bytes = adapter.read("pics/photo.jpg").await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod api;
pub mod config;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod mime;
pub mod options;
pub mod path;
pub mod resource;
pub mod visibility;

pub use adapter::AssetFsAdapter;
pub use config::AdapterConfig;
pub use error::{AssetFsError, Result};
pub use options::WriteOptions;
pub use resource::ResourceType;
pub use visibility::{UploadType, Visibility};
