//! Adapter core
//!
//! Translates generic filesystem operations onto the remote asset store's
//! resource-type/upload-type/public-id model. The remote API is not a
//! filesystem: it has no empty directories, cannot change access control
//! after upload, partitions assets into three namespaces and lists files
//! and folders through two unrelated endpoints. Each operation here is a
//! best-effort sequence of remote calls with compensating logic, not a
//! transaction.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use async_stream::try_stream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::api::{
    AssetApi, AssetDescriptor, DeleteParams, DeleteStatus, DescribeParams, FolderPage,
    RenameParams, SearchQuery, SortOrder, UploadParams, UploadSource,
};
use crate::config::AdapterConfig;
use crate::entry::{DirectoryEntry, Entry, EntryStream, FileEntry};
use crate::error::{AssetFsError, Result};
use crate::fetch::{ByteFetcher, ByteStream, HttpFetcher};
use crate::logging::{AdapterLogger, LogSink};
use crate::mime::{ExtensionMimeDetector, MimeDetector};
use crate::options::WriteOptions;
use crate::path::{self, Prefixer};
use crate::resource::{ResourceType, ResourceTypeClassifier};
use crate::visibility::{UploadType, Visibility, VisibilityConverter};

/// Remote batch-delete limit per call.
const DELETE_BATCH_SIZE: usize = 100;
/// Page size for subfolder listing.
const FOLDER_PAGE_SIZE: u32 = 500;
/// Page size for file search.
const SEARCH_PAGE_SIZE: u32 = 500;

/// Checksum algorithms computable locally; `etag` is read from the remote
/// descriptor instead.
const CHECKSUM_ALGOS: &[&str] = &["md5", "sha1", "sha256"];

/// Filesystem-style adapter over a remote asset-management API.
pub struct AssetFsAdapter<C> {
    client: C,
    config: Arc<AdapterConfig>,
    prefixer: Prefixer,
    classifier: ResourceTypeClassifier,
    converter: VisibilityConverter,
    detector: Arc<dyn MimeDetector>,
    fetcher: Arc<dyn ByteFetcher>,
    logger: AdapterLogger,
}

impl<C: AssetApi> AssetFsAdapter<C> {
    /// Create an adapter over the given remote client. The configuration
    /// is validated here; violations never reach the network.
    pub fn new(client: C, config: AdapterConfig) -> Result<Self> {
        let config = config.validate()?;
        let prefixer = Prefixer::new(&config.prefix);
        Ok(Self {
            client,
            config: Arc::new(config),
            prefixer,
            classifier: ResourceTypeClassifier::default(),
            converter: VisibilityConverter::default(),
            detector: Arc::new(ExtensionMimeDetector),
            fetcher: Arc::new(HttpFetcher::default()),
            logger: AdapterLogger::disabled(),
        })
    }

    pub fn with_classifier(mut self, classifier: ResourceTypeClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_converter(mut self, converter: VisibilityConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn MimeDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ByteFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Enable logging through the given sink. Fails with
    /// [`AssetFsError::NoLoggerConfigured`] when `sink` is `None`.
    pub fn with_logging(mut self, sink: Option<Arc<dyn LogSink>>) -> Result<Self> {
        self.logger = AdapterLogger::enabled(sink)?;
        Ok(self)
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    // ---------------------------------------------------------------
    // Identifier resolution
    // ---------------------------------------------------------------

    /// Resolve the resource type for a path from the detected mime type.
    fn resource_type_for_path(&self, path: &str) -> ResourceType {
        let mime = self.detector.detect_from_path(path);
        self.classifier.classify(mime.as_deref())
    }

    /// Derive the full remote public id for a path under a resource type.
    fn remote_id(&self, path: &str, resource_type: ResourceType) -> String {
        path::public_id(&self.prefixer.apply(path), resource_type)
    }

    fn describe_params(&self, resource_type: ResourceType) -> DescribeParams {
        DescribeParams {
            resource_type: Some(resource_type),
            upload_type: None,
            extra_fields: self.config.metadata_fields.clone(),
        }
    }

    /// Fetch the descriptor for a path, resolving type and id first.
    async fn describe(&self, path: &str) -> Result<AssetDescriptor> {
        let resource_type = self.resource_type_for_path(path);
        let public_id = self.remote_id(path, resource_type);
        self.logger.debug(
            "describing asset",
            &[
                ("path", path.to_string()),
                ("public_id", public_id.clone()),
                ("resource_type", resource_type.to_string()),
            ],
        );
        self.client
            .describe_asset(&public_id, &self.describe_params(resource_type))
            .await
    }

    /// Existence check without operation-specific wrapping.
    async fn probe(&self, path: &str) -> Result<bool> {
        match self.describe(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => {
                self.logger
                    .debug("asset not found", &[("path", path.to_string())]);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    // ---------------------------------------------------------------
    // Existence
    // ---------------------------------------------------------------

    /// Whether a file exists at the path.
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        self.probe(path).await.map_err(|e| {
            self.critical("existence check failed", path, &e);
            AssetFsError::CheckExistenceFailed {
                path: path.to_string(),
                source: Box::new(e),
            }
        })
    }

    /// Whether a directory exists at the path.
    ///
    /// The remote store has no directory objects; a folder exists when the
    /// subfolder listing of its parent reports it. The logical root always
    /// exists, prefix or not: it is the adapter's own scope, even before
    /// the prefix folder materializes on the remote.
    pub async fn directory_exists(&self, path: &str) -> Result<bool> {
        if path::normalize(path).is_empty() {
            return Ok(true);
        }
        let remote_dir = self.prefixer.apply(path);
        let (name, parent) = path::split_path(&remote_dir);

        let mut cursor: Option<String> = None;
        loop {
            let page = match self
                .client
                .list_subfolders(&parent, FOLDER_PAGE_SIZE, cursor.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) if e.is_not_found() => return Ok(false),
                Err(e) => {
                    self.critical("directory existence check failed", path, &e);
                    return Err(AssetFsError::CheckExistenceFailed {
                        path: path.to_string(),
                        source: Box::new(e),
                    });
                }
            };
            if page
                .folders
                .iter()
                .any(|f| f.path == remote_dir || f.name == name)
            {
                return Ok(true);
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(false),
            }
        }
    }

    // ---------------------------------------------------------------
    // Write
    // ---------------------------------------------------------------

    /// Write a byte payload to a path.
    ///
    /// The remote API does not accept zero-length uploads, so an empty
    /// payload fails with `WriteFailed` instead of silently succeeding.
    pub async fn write(&self, path: &str, contents: &[u8], options: &WriteOptions) -> Result<()> {
        if contents.is_empty() {
            let cause = AssetFsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty payload: the remote store rejects zero-length uploads",
            ));
            self.critical("write of empty payload rejected", path, &cause);
            return Err(AssetFsError::WriteFailed {
                path: path.to_string(),
                source: Box::new(cause),
            });
        }
        self.write_stream(path, contents, options).await
    }

    /// Write a byte stream to a path.
    ///
    /// The payload is materialized to a temporary file first: the remote
    /// upload call needs a rewindable source, and the mime detector gets a
    /// chance to sniff the staged bytes.
    pub async fn write_stream<R>(&self, path: &str, mut reader: R, options: &WriteOptions) -> Result<()>
    where
        R: AsyncRead + Send + Unpin,
    {
        let wrap = |e: AssetFsError| AssetFsError::WriteFailed {
            path: path.to_string(),
            source: Box::new(e),
        };

        let staged = tempfile::NamedTempFile::new().map_err(|e| wrap(e.into()))?;
        let mut sink = tokio::fs::File::create(staged.path())
            .await
            .map_err(|e| wrap(e.into()))?;
        let written = tokio::io::copy(&mut reader, &mut sink)
            .await
            .map_err(|e| wrap(e.into()))?;
        sink.flush().await.map_err(|e| wrap(e.into()))?;
        if written == 0 {
            let cause = AssetFsError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty payload: the remote store rejects zero-length uploads",
            ));
            self.critical("write of empty payload rejected", path, &cause);
            return Err(wrap(cause));
        }

        let mime = self.detector.detect_from_file(path, staged.path());
        let source = UploadSource::LocalFile(staged.path().to_path_buf());
        match self.persist(path, source, mime, options).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.critical("write failed", path, &e);
                Err(wrap(e))
            }
        }
    }

    /// Shared write path: delete-before-upload compensation, identifier
    /// and access-type resolution, then the remote upload.
    async fn persist(
        &self,
        path: &str,
        source: UploadSource,
        mime: Option<String>,
        options: &WriteOptions,
    ) -> Result<AssetDescriptor> {
        // Overwriting an asset with a different access type makes the
        // remote store create a second object under the old id. Deleting
        // first keeps the path single-valued. A crash between the delete
        // and the upload leaves the path absent until the caller retries.
        if self.probe(path).await? {
            self.logger.debug(
                "deleting existing asset before overwrite",
                &[("path", path.to_string())],
            );
            self.delete(path).await?;
        }

        let resource_type = options
            .resource_type
            .unwrap_or_else(|| self.classifier.classify(mime.as_deref()));

        let full_id = options
            .public_id
            .clone()
            .unwrap_or_else(|| self.remote_id(path, resource_type));
        let (public_id, folder) = path::split_path(&full_id);

        let upload_type = options.upload_type.unwrap_or_else(|| {
            options
                .visibility
                .map(|v| self.converter.to_upload_type(v))
                .unwrap_or_else(|| self.converter.default_upload_type())
        });

        let mut extra = match resource_type {
            // The media pipelines accept the optional-feature parameters;
            // raw uploads do not.
            ResourceType::Image | ResourceType::Video => options.media_params(),
            ResourceType::Raw => serde_json::Map::new(),
        };
        extra.extend(options.passthrough_params());

        let filename_override = match resource_type {
            ResourceType::Raw => Some(path::split_path(path).0),
            _ => None,
        };

        let params = UploadParams {
            resource_type,
            upload_type,
            public_id,
            folder,
            overwrite: options.overwrite.unwrap_or(true),
            invalidate: options.invalidate.unwrap_or(true),
            upload_preset: options
                .upload_preset
                .clone()
                .or_else(|| self.config.upload_preset.clone()),
            filename_override,
            extra,
        };

        self.logger.debug(
            "uploading asset",
            &[
                ("path", path.to_string()),
                ("resource_type", resource_type.to_string()),
                ("upload_type", upload_type.to_string()),
            ],
        );
        self.client.upload(source, &params).await
    }

    // ---------------------------------------------------------------
    // Read
    // ---------------------------------------------------------------

    async fn delivery_url(&self, path: &str) -> Result<String> {
        let descriptor = self.describe(path).await?;
        descriptor
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AssetFsError::UrlGenerationFailed {
                path: path.to_string(),
                reason: "descriptor carries no delivery URL".to_string(),
            })
    }

    /// Read the full contents of a file.
    pub async fn read(&self, path: &str) -> Result<Bytes> {
        let wrap = |e: AssetFsError| AssetFsError::ReadFailed {
            path: path.to_string(),
            source: Box::new(e),
        };
        let url = self.delivery_url(path).await.map_err(|e| {
            self.critical("read failed", path, &e);
            wrap(e)
        })?;
        self.fetcher.fetch(&url).await.map_err(|e| {
            self.critical("read failed", path, &e);
            wrap(e)
        })
    }

    /// Open a file as a byte stream.
    pub async fn read_stream(&self, path: &str) -> Result<ByteStream> {
        let wrap = |e: AssetFsError| AssetFsError::ReadFailed {
            path: path.to_string(),
            source: Box::new(e),
        };
        let url = self.delivery_url(path).await.map_err(|e| {
            self.critical("read failed", path, &e);
            wrap(e)
        })?;
        self.fetcher.fetch_stream(&url).await.map_err(|e| {
            self.critical("read failed", path, &e);
            wrap(e)
        })
    }

    // ---------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------

    /// Delete a file. Deleting a path that does not exist succeeds.
    ///
    /// The asset's upload type is not known at this point, so the delete is
    /// attempted under each type in a fixed order until the remote reports
    /// the id deleted. A "not found" under one type just means "try the
    /// next".
    pub async fn delete(&self, path: &str) -> Result<()> {
        let exists = self.probe(path).await.map_err(|e| {
            self.critical("delete failed", path, &e);
            AssetFsError::DeleteFailed {
                path: path.to_string(),
                source: Box::new(e),
            }
        })?;
        if !exists {
            self.logger
                .debug("delete of absent path is a no-op", &[("path", path.to_string())]);
            return Ok(());
        }

        let resource_type = self.resource_type_for_path(path);
        let public_id = self.remote_id(path, resource_type);
        let ids = vec![public_id.clone()];

        for upload_type in UploadType::DELETE_ORDER {
            let params = DeleteParams {
                resource_type,
                upload_type,
                invalidate: true,
            };
            match self.client.delete_assets(&ids, &params).await {
                Ok(statuses) => {
                    if statuses.get(&public_id) == Some(&DeleteStatus::Deleted) {
                        return Ok(());
                    }
                    self.logger.debug(
                        "asset not deleted under upload type, trying next",
                        &[
                            ("public_id", public_id.clone()),
                            ("upload_type", upload_type.to_string()),
                        ],
                    );
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    self.logger.error(
                        "delete attempt failed",
                        &[
                            ("public_id", public_id.clone()),
                            ("upload_type", upload_type.to_string()),
                            ("error", e.to_string()),
                        ],
                    );
                }
            }
        }

        let cause = AssetFsError::Remote(format!(
            "asset {public_id} not deleted under any upload type"
        ));
        self.critical("delete failed", path, &cause);
        Err(AssetFsError::DeleteFailed {
            path: path.to_string(),
            source: Box::new(cause),
        })
    }

    /// Delete a directory and every descendant file.
    ///
    /// Deletion is strictly sequential: resource-type bucket by bucket,
    /// chunk by chunk, so the state after a crash is always a prefix of
    /// the work done, never an interleaving.
    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        let wrap = |e: AssetFsError| AssetFsError::DeleteDirectoryFailed {
            path: path.to_string(),
            source: Box::new(e),
        };
        let remote_dir = self.prefixer.apply(path);

        // Non-recursive listing is insufficient: every descendant must go.
        let mut buckets: BTreeMap<ResourceType, Vec<String>> = BTreeMap::new();
        {
            let mut files = self.file_descriptors(remote_dir.clone(), true);
            while let Some(result) = files.next().await {
                let descriptor = result.map_err(|e| {
                    self.critical("directory deletion failed", path, &e);
                    wrap(e)
                })?;
                buckets
                    .entry(descriptor.resource_type)
                    .or_default()
                    .push(descriptor.public_id);
            }
        }

        for (resource_type, ids) in buckets {
            for chunk in ids.chunks(DELETE_BATCH_SIZE) {
                self.delete_chunk(path, resource_type, chunk)
                    .await
                    .map_err(|e| {
                        self.critical("directory deletion failed", path, &e);
                        wrap(e)
                    })?;
            }
        }

        match self.client.delete_folder(&remote_dir).await {
            Ok(()) => Ok(()),
            // The folder can already be gone once its last file is deleted.
            Err(e) if e.is_not_found() => {
                self.logger
                    .debug("folder already absent", &[("path", path.to_string())]);
                Ok(())
            }
            Err(e) => {
                self.critical("directory deletion failed", path, &e);
                Err(wrap(e))
            }
        }
    }

    /// Delete one chunk of ids, retrying undeleted ids under each upload
    /// type in order. Ids surviving all three types are a hard failure.
    async fn delete_chunk(
        &self,
        path: &str,
        resource_type: ResourceType,
        chunk: &[String],
    ) -> Result<()> {
        let mut remaining: Vec<String> = chunk.to_vec();

        for upload_type in UploadType::DELETE_ORDER {
            if remaining.is_empty() {
                break;
            }
            let params = DeleteParams {
                resource_type,
                upload_type,
                invalidate: true,
            };
            match self.client.delete_assets(&remaining, &params).await {
                Ok(statuses) => {
                    remaining.retain(|id| statuses.get(id) != Some(&DeleteStatus::Deleted));
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    self.logger.error(
                        "batch delete attempt failed",
                        &[
                            ("path", path.to_string()),
                            ("resource_type", resource_type.to_string()),
                            ("upload_type", upload_type.to_string()),
                            ("error", e.to_string()),
                        ],
                    );
                }
            }
        }

        if remaining.is_empty() {
            Ok(())
        } else {
            Err(AssetFsError::Remote(format!(
                "{} asset(s) not deleted under any upload type: {}",
                remaining.len(),
                remaining.join(", ")
            )))
        }
    }

    // ---------------------------------------------------------------
    // Directories
    // ---------------------------------------------------------------

    /// Create a directory.
    pub async fn create_directory(&self, path: &str) -> Result<()> {
        let remote_dir = self.prefixer.apply(path);
        self.client.create_folder(&remote_dir).await.map_err(|e| {
            self.critical("directory creation failed", path, &e);
            AssetFsError::CreateDirectoryFailed {
                path: path.to_string(),
                source: Box::new(e),
            }
        })
    }

    // ---------------------------------------------------------------
    // Visibility and metadata
    // ---------------------------------------------------------------

    /// Always fails: the remote API assigns access control at upload time
    /// only. This is a permanent capability gap, not a bug.
    pub async fn set_visibility(&self, _path: &str, _visibility: Visibility) -> Result<()> {
        Err(AssetFsError::VisibilityUnsupported)
    }

    /// The visibility of a file, derived from its upload type.
    pub async fn visibility(&self, path: &str) -> Result<Visibility> {
        let descriptor = self.metadata_descriptor(path, "visibility").await?;
        Ok(self.converter.to_visibility(descriptor.upload_type))
    }

    /// The mime type of a file, derived from its remote path.
    pub async fn mime_type(&self, path: &str) -> Result<String> {
        let descriptor = self.metadata_descriptor(path, "mime_type").await?;
        self.detector
            .detect_from_path(&descriptor.remote_path())
            .or_else(|| self.detector.detect_from_path(path))
            .ok_or(AssetFsError::MetadataUnavailable {
                path: path.to_string(),
                field: "mime_type",
                source: None,
            })
    }

    /// The creation timestamp of a file.
    pub async fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        let descriptor = self.metadata_descriptor(path, "last_modified").await?;
        descriptor
            .created_at
            .ok_or(AssetFsError::MetadataUnavailable {
                path: path.to_string(),
                field: "last_modified",
                source: None,
            })
    }

    /// The byte size of a file.
    pub async fn file_size(&self, path: &str) -> Result<u64> {
        let descriptor = self.metadata_descriptor(path, "file_size").await?;
        Ok(descriptor.bytes)
    }

    async fn metadata_descriptor(
        &self,
        path: &str,
        field: &'static str,
    ) -> Result<AssetDescriptor> {
        self.describe(path).await.map_err(|e| {
            self.critical("metadata query failed", path, &e);
            AssetFsError::MetadataUnavailable {
                path: path.to_string(),
                field,
                source: Some(Box::new(e)),
            }
        })
    }

    /// Compute or read a checksum for a file. The default `etag` algorithm
    /// reads the remote-provided etag verbatim; any other supported
    /// algorithm fetches the content and hashes it locally.
    pub async fn checksum(&self, path: &str, algo: Option<&str>) -> Result<String> {
        let algo = algo.unwrap_or("etag");
        // Validated before any network traffic.
        if algo != "etag" && !CHECKSUM_ALGOS.contains(&algo) {
            return Err(AssetFsError::ChecksumAlgoNotSupported(algo.to_string()));
        }

        if algo == "etag" {
            let descriptor = self.describe(path).await.map_err(|e| {
                self.critical("checksum failed", path, &e);
                AssetFsError::ChecksumFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
            })?;
            return descriptor
                .etag
                .filter(|etag| !etag.is_empty())
                .ok_or_else(|| AssetFsError::ChecksumFailed {
                    path: path.to_string(),
                    reason: "descriptor carries no etag".to_string(),
                });
        }

        let contents = self.read(path).await.map_err(|e| {
            self.critical("checksum failed", path, &e);
            AssetFsError::ChecksumFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(match algo {
            "md5" => hex::encode(Md5::digest(&contents)),
            "sha1" => hex::encode(Sha1::digest(&contents)),
            "sha256" => hex::encode(Sha256::digest(&contents)),
            // Unreachable after the validation above.
            other => return Err(AssetFsError::ChecksumAlgoNotSupported(other.to_string())),
        })
    }

    /// The public delivery URL of a file.
    pub async fn public_url(&self, path: &str) -> Result<String> {
        let descriptor = self.describe(path).await.map_err(|e| {
            self.critical("url generation failed", path, &e);
            AssetFsError::UrlGenerationFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;
        descriptor
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AssetFsError::UrlGenerationFailed {
                path: path.to_string(),
                reason: "descriptor carries no delivery URL".to_string(),
            })
    }

    // ---------------------------------------------------------------
    // Listing
    // ---------------------------------------------------------------

    /// List the contents of a directory lazily: directories first, then
    /// files, because they come from two remote endpoints with independent
    /// pagination. Every call re-queries from scratch; abandoning the
    /// stream early triggers no further remote calls.
    pub fn list_contents(&self, path: &str, deep: bool) -> EntryStream<'_> {
        let logical = path::normalize(path);
        let remote_dir = self.prefixer.apply(path);

        Box::pin(try_stream! {
            let mut folders = self.folder_entries(remote_dir.clone(), deep);
            while let Some(result) = folders.next().await {
                let entry = result.map_err(|e| self.list_error(&logical, e))?;
                yield entry;
            }

            let mut files = self.file_descriptors(remote_dir.clone(), deep);
            while let Some(result) = files.next().await {
                let descriptor = result.map_err(|e| self.list_error(&logical, e))?;
                yield Entry::File(self.file_entry(descriptor));
            }
        })
    }

    fn list_error(&self, path: &str, e: AssetFsError) -> AssetFsError {
        self.critical("listing failed", path, &e);
        AssetFsError::ListFailed {
            path: path.to_string(),
            source: Box::new(e),
        }
    }

    /// Paginated subfolder entries. For deep listings each folder is
    /// recursed into depth-first before its remaining siblings, so entries
    /// come out in tree order.
    fn folder_entries(&self, remote_dir: String, deep: bool) -> EntryStream<'_> {
        Box::pin(try_stream! {
            let mut cursor: Option<String> = None;
            loop {
                let page: FolderPage = match self
                    .client
                    .list_subfolders(&remote_dir, FOLDER_PAGE_SIZE, cursor.as_deref())
                    .await
                {
                    Ok(page) => page,
                    // An absent folder simply has no subfolders.
                    Err(e) if e.is_not_found() => break,
                    Err(e) => Err(e)?,
                };

                for folder in page.folders {
                    yield Entry::Directory(DirectoryEntry {
                        path: self.prefixer.strip(&folder.path),
                    });
                    if deep {
                        let mut nested = self.folder_entries(folder.path.clone(), true);
                        while let Some(result) = nested.next().await {
                            let entry = result?;
                            yield entry;
                        }
                    }
                }

                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
        })
    }

    /// Paginated file descriptors under a remote directory, sorted by
    /// public id for determinism. Shallow listings drop results nested
    /// more than one level below the directory.
    fn file_descriptors(
        &self,
        remote_dir: String,
        deep: bool,
    ) -> BoxStream<'_, Result<AssetDescriptor>> {
        Box::pin(try_stream! {
            let expression = search_expression(&remote_dir);
            let mut cursor: Option<String> = None;
            loop {
                let query = SearchQuery {
                    expression: expression.clone(),
                    with_field: self.config.metadata_fields.clone(),
                    sort_by: vec![("public_id".to_string(), SortOrder::Asc)],
                    max_results: SEARCH_PAGE_SIZE,
                    cursor: cursor.clone(),
                };
                let page = match self.client.search(&query).await {
                    Ok(page) => page,
                    Err(e) if e.is_not_found() => break,
                    Err(e) => Err(e)?,
                };

                for descriptor in page.resources {
                    if !deep {
                        let remote_path = descriptor.remote_path();
                        let relative = if remote_dir.is_empty() {
                            remote_path.as_str()
                        } else {
                            remote_path
                                .strip_prefix(&format!("{}/", remote_dir))
                                .unwrap_or(remote_path.as_str())
                        };
                        if relative.contains('/') {
                            continue;
                        }
                    }
                    yield descriptor;
                }

                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
        })
    }

    fn file_entry(&self, descriptor: AssetDescriptor) -> FileEntry {
        FileEntry {
            path: self.prefixer.strip(&descriptor.remote_path()),
            size: descriptor.bytes,
            last_modified: descriptor.created_at,
            visibility: self.converter.to_visibility(descriptor.upload_type),
            extra: descriptor.extra,
        }
    }

    // ---------------------------------------------------------------
    // Move and copy
    // ---------------------------------------------------------------

    /// Move a file via the remote rename call, verifying the resulting
    /// identifier matches the destination.
    pub async fn move_to(
        &self,
        source: &str,
        destination: &str,
        options: &WriteOptions,
    ) -> Result<()> {
        let wrap = |e: AssetFsError| AssetFsError::MoveFailed {
            from: source.to_string(),
            to: destination.to_string(),
            source: Box::new(e),
        };

        let resource_type = options
            .resource_type
            .unwrap_or_else(|| self.resource_type_for_path(source));
        let from_id = self.remote_id(source, resource_type);
        let to_id = self.remote_id(destination, resource_type);

        // Prefer the asset's actual upload type; fall back to the
        // visibility-derived type when the descriptor is unavailable.
        let from_type = match self.describe(source).await {
            Ok(descriptor) => descriptor.upload_type,
            Err(e) => {
                self.logger.warning(
                    "falling back to visibility-derived upload type for move",
                    &[("path", source.to_string()), ("error", e.to_string())],
                );
                options
                    .visibility
                    .map(|v| self.converter.to_upload_type(v))
                    .unwrap_or_else(|| self.converter.default_upload_type())
            }
        };

        let params = RenameParams {
            resource_type,
            from_type,
            to_type: options.to_type.unwrap_or(from_type),
            overwrite: options.overwrite.unwrap_or(true),
            invalidate: options.invalidate.unwrap_or(true),
        };

        let renamed = self
            .client
            .rename_asset(&from_id, &to_id, &params)
            .await
            .map_err(|e| {
                self.critical("move failed", source, &e);
                wrap(e)
            })?;

        if renamed.public_id != to_id {
            let cause = AssetFsError::Remote(format!(
                "rename produced unexpected identifier {} (wanted {})",
                renamed.public_id, to_id
            ));
            self.critical("move failed", source, &cause);
            return Err(wrap(cause));
        }
        Ok(())
    }

    /// Copy a file by re-uploading its contents at the destination, keeping
    /// the source's resolved resource type.
    pub async fn copy(
        &self,
        source: &str,
        destination: &str,
        options: &WriteOptions,
    ) -> Result<()> {
        let wrap = |e: AssetFsError| AssetFsError::CopyFailed {
            from: source.to_string(),
            to: destination.to_string(),
            source: Box::new(e),
        };

        let descriptor = self.describe(source).await.map_err(|e| {
            self.critical("copy failed", source, &e);
            wrap(e)
        })?;

        let contents = self.read(source).await.map_err(|e| {
            self.critical("copy failed", source, &e);
            wrap(e)
        })?;

        let mut options = options.clone();
        options.resource_type = Some(descriptor.resource_type);

        let mime = self.detector.detect_from_path(source);
        self.persist(
            destination,
            UploadSource::Bytes(contents),
            mime,
            &options,
        )
        .await
        .map(|_| ())
        .map_err(|e| {
            self.critical("copy failed", destination, &e);
            wrap(e)
        })
    }

    fn critical(&self, message: &str, path: &str, error: &AssetFsError) {
        self.logger.critical(
            message,
            &[("path", path.to_string()), ("error", error.to_string())],
        );
    }
}

/// Search expression for all files under a directory. The path clause is
/// omitted at the root; the resource-type clause always spans all three
/// namespaces.
fn search_expression(remote_dir: &str) -> String {
    if remote_dir.is_empty() {
        "resource_type:(image OR video OR raw)".to_string()
    } else {
        format!(
            "resource_type:(image OR video OR raw) AND public_id:{remote_dir}/*"
        )
    }
}
