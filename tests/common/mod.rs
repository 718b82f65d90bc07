//! Shared test fixtures: an in-memory fake of the remote asset API.
//!
//! The fake mimics the remote store's quirks the adapter has to reconcile:
//! type-partitioned assets, per-upload-type deletes with per-id status
//! maps, implicit folder creation, folder/file listing through two
//! separate endpoints, and delete-time folder emptiness checks.

// Not every test binary uses every fixture helper.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use md5::{Digest, Md5};
use parking_lot::Mutex;

use assetfs::adapter::AssetFsAdapter;
use assetfs::api::{
    AssetApi, AssetDescriptor, DeleteParams, DeleteStatus, DescribeParams, FolderPage,
    FolderRecord, RenameParams, SearchPage, SearchQuery, UploadParams, UploadSource,
};
use assetfs::config::AdapterConfig;
use assetfs::error::{AssetFsError, Result};
use assetfs::fetch::{ByteFetcher, ByteStream};
use assetfs::logging::TracingSink;
use assetfs::resource::ResourceType;
use assetfs::visibility::UploadType;

#[derive(Debug, Clone)]
struct StoredAsset {
    public_id: String,
    resource_type: ResourceType,
    upload_type: UploadType,
    format: Option<String>,
    payload: Bytes,
    created_at: DateTime<Utc>,
}

impl StoredAsset {
    fn remote_path(&self) -> String {
        match &self.format {
            Some(format) if self.resource_type != ResourceType::Raw => {
                format!("{}.{}", self.public_id, format)
            }
            _ => self.public_id.clone(),
        }
    }

    fn url(&self) -> String {
        format!(
            "https://res.fake.test/{}/{}/{}",
            self.resource_type,
            self.upload_type,
            self.remote_path()
        )
    }

    fn descriptor(&self) -> AssetDescriptor {
        AssetDescriptor {
            public_id: self.public_id.clone(),
            resource_type: self.resource_type,
            upload_type: self.upload_type,
            format: self.format.clone(),
            bytes: self.payload.len() as u64,
            created_at: Some(self.created_at),
            etag: Some(hex::encode(Md5::digest(&self.payload))),
            secure_url: Some(self.url()),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Default)]
struct Inner {
    assets: BTreeMap<(ResourceType, String), StoredAsset>,
    folders: BTreeSet<String>,
    calls: Vec<String>,
    delete_batches: Vec<usize>,
    folder_page_size: Option<usize>,
    search_page_size: Option<usize>,
    rename_returns_wrong_id: bool,
}

impl Inner {
    fn insert_ancestors(&mut self, folder: &str) {
        let mut prefix = String::new();
        for segment in folder.split('/').filter(|s| !s.is_empty()) {
            if prefix.is_empty() {
                prefix = segment.to_string();
            } else {
                prefix = format!("{prefix}/{segment}");
            }
            self.folders.insert(prefix.clone());
        }
    }

    fn folder_known(&self, path: &str) -> bool {
        path.is_empty() || self.folders.contains(path)
    }
}

/// The remote-store format sniff: the real API derives the delivery format
/// from the uploaded bytes, so the fake does too, for a handful of magics.
fn sniff_format(payload: &[u8]) -> Option<&'static str> {
    if payload.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if payload.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if payload.starts_with(b"GIF8") {
        Some("gif")
    } else if payload.starts_with(b"%PDF") {
        Some("pdf")
    } else {
        None
    }
}

/// Minimal JPEG payload for media-pathway tests.
pub fn jpeg_payload(filler: &[u8]) -> Vec<u8> {
    let mut payload = vec![0xFF, 0xD8, 0xFF, 0xE0];
    payload.extend_from_slice(filler);
    payload
}

/// Minimal PDF payload.
pub fn pdf_payload(filler: &[u8]) -> Vec<u8> {
    let mut payload = b"%PDF-1.4\n".to_vec();
    payload.extend_from_slice(filler);
    payload
}

/// In-memory fake of the remote asset-management API. Cloneable handle;
/// all clones share state so tests can inspect it after adapter calls.
#[derive(Clone, Default)]
pub struct FakeRemote {
    inner: Arc<Mutex<Inner>>,
}

impl FakeRemote {
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    pub fn delete_batches(&self) -> Vec<usize> {
        self.inner.lock().delete_batches.clone()
    }

    pub fn set_folder_page_size(&self, size: usize) {
        self.inner.lock().folder_page_size = Some(size);
    }

    pub fn set_search_page_size(&self, size: usize) {
        self.inner.lock().search_page_size = Some(size);
    }

    pub fn set_rename_returns_wrong_id(&self, wrong: bool) {
        self.inner.lock().rename_returns_wrong_id = wrong;
    }

    pub fn asset_count(&self) -> usize {
        self.inner.lock().assets.len()
    }

    /// The namespace an id was stored under, scanning all three.
    pub fn resource_type_of(&self, public_id: &str) -> Option<ResourceType> {
        let inner = self.inner.lock();
        ResourceType::ALL
            .into_iter()
            .find(|rt| inner.assets.contains_key(&(*rt, public_id.to_string())))
    }

    pub fn upload_type_of(&self, public_id: &str) -> Option<UploadType> {
        let inner = self.inner.lock();
        ResourceType::ALL.into_iter().find_map(|rt| {
            inner
                .assets
                .get(&(rt, public_id.to_string()))
                .map(|a| a.upload_type)
        })
    }

    fn fetch_payload(&self, url: &str) -> Option<Bytes> {
        let inner = self.inner.lock();
        inner
            .assets
            .values()
            .find(|a| a.url() == url)
            .map(|a| a.payload.clone())
    }
}

#[async_trait]
impl AssetApi for FakeRemote {
    async fn upload(
        &self,
        source: UploadSource,
        params: &UploadParams,
    ) -> Result<AssetDescriptor> {
        let payload = match source {
            UploadSource::LocalFile(path) => Bytes::from(std::fs::read(path)?),
            UploadSource::Bytes(bytes) => bytes,
        };
        if payload.is_empty() {
            return Err(AssetFsError::Remote("empty payloads are rejected".into()));
        }

        let full_id = if params.folder.is_empty() {
            params.public_id.clone()
        } else {
            format!("{}/{}", params.folder, params.public_id)
        };

        let mut inner = self.inner.lock();
        inner.calls.push(format!("upload:{full_id}"));

        let key = (params.resource_type, full_id.clone());
        if !params.overwrite && inner.assets.contains_key(&key) {
            return Err(AssetFsError::Remote(format!(
                "asset {full_id} already exists"
            )));
        }

        inner.insert_ancestors(&params.folder);
        let format = match params.resource_type {
            ResourceType::Raw => None,
            _ => sniff_format(&payload).map(str::to_string),
        };
        let asset = StoredAsset {
            public_id: full_id,
            resource_type: params.resource_type,
            upload_type: params.upload_type,
            format,
            payload,
            created_at: Utc::now(),
        };
        let descriptor = asset.descriptor();
        inner.assets.insert(key, asset);
        Ok(descriptor)
    }

    async fn rename_asset(
        &self,
        from_id: &str,
        to_id: &str,
        params: &RenameParams,
    ) -> Result<AssetDescriptor> {
        let mut inner = self.inner.lock();
        inner.calls.push(format!("rename:{from_id}->{to_id}"));

        let from_key = (params.resource_type, from_id.to_string());
        let matches = inner
            .assets
            .get(&from_key)
            .map(|a| a.upload_type == params.from_type)
            .unwrap_or(false);
        if !matches {
            return Err(AssetFsError::NotFound(from_id.to_string()));
        }
        let to_key = (params.resource_type, to_id.to_string());
        if inner.assets.contains_key(&to_key) && !params.overwrite {
            return Err(AssetFsError::Remote(format!(
                "asset {to_id} already exists"
            )));
        }

        let mut asset = inner.assets.remove(&from_key).expect("checked above");
        asset.public_id = to_id.to_string();
        asset.upload_type = params.to_type;
        let mut descriptor = asset.descriptor();
        inner.assets.insert(to_key, asset);

        if inner.rename_returns_wrong_id {
            descriptor.public_id = format!("{to_id}-mangled");
        }
        Ok(descriptor)
    }

    async fn delete_assets(
        &self,
        public_ids: &[String],
        params: &DeleteParams,
    ) -> Result<BTreeMap<String, DeleteStatus>> {
        let mut inner = self.inner.lock();
        inner.delete_batches.push(public_ids.len());
        inner.calls.push(format!(
            "delete_assets:{}:{}",
            params.upload_type,
            public_ids.len()
        ));

        let mut statuses = BTreeMap::new();
        for id in public_ids {
            let key = (params.resource_type, id.clone());
            let deletable = inner
                .assets
                .get(&key)
                .map(|a| a.upload_type == params.upload_type)
                .unwrap_or(false);
            let status = if deletable {
                inner.assets.remove(&key);
                DeleteStatus::Deleted
            } else {
                DeleteStatus::NotFound
            };
            statuses.insert(id.clone(), status);
        }
        Ok(statuses)
    }

    async fn describe_asset(
        &self,
        public_id: &str,
        params: &DescribeParams,
    ) -> Result<AssetDescriptor> {
        let inner = self.inner.lock();
        let type_matches = |a: &StoredAsset| {
            params
                .upload_type
                .map(|t| a.upload_type == t)
                .unwrap_or(true)
        };

        let namespaces: Vec<ResourceType> = match params.resource_type {
            Some(rt) => vec![rt],
            None => ResourceType::ALL.to_vec(),
        };
        for rt in namespaces {
            if let Some(asset) = inner.assets.get(&(rt, public_id.to_string())) {
                if type_matches(asset) {
                    return Ok(asset.descriptor());
                }
            }
        }
        Err(AssetFsError::NotFound(public_id.to_string()))
    }

    async fn list_subfolders(
        &self,
        path: &str,
        max_results: u32,
        cursor: Option<&str>,
    ) -> Result<FolderPage> {
        let inner = self.inner.lock();
        inner
            .folder_known(path)
            .then_some(())
            .ok_or_else(|| AssetFsError::NotFound(path.to_string()))?;

        let children: Vec<FolderRecord> = inner
            .folders
            .iter()
            .filter(|f| {
                let (name, parent) = match f.rsplit_once('/') {
                    Some((parent, name)) => (name, parent),
                    None => (f.as_str(), ""),
                };
                !name.is_empty() && parent == path
            })
            .map(|f| FolderRecord {
                name: f.rsplit('/').next().unwrap_or(f).to_string(),
                path: f.clone(),
            })
            .collect();

        let page_size = inner
            .folder_page_size
            .unwrap_or(max_results as usize)
            .max(1);
        let offset: usize = cursor.map(|c| c.parse().unwrap_or(0)).unwrap_or(0);
        let end = (offset + page_size).min(children.len());
        let next_cursor = (end < children.len()).then(|| end.to_string());

        Ok(FolderPage {
            folders: children[offset..end].to_vec(),
            next_cursor,
        })
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(format!("create_folder:{path}"));
        inner.insert_ancestors(path);
        Ok(())
    }

    async fn delete_folder(&self, path: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(format!("delete_folder:{path}"));
        if !inner.folders.contains(path) {
            return Err(AssetFsError::NotFound(path.to_string()));
        }
        let occupied = inner
            .assets
            .values()
            .any(|a| a.public_id.starts_with(&format!("{path}/")));
        if occupied {
            return Err(AssetFsError::Remote(format!("folder {path} is not empty")));
        }
        let doomed: Vec<String> = inner
            .folders
            .iter()
            .filter(|f| f.as_str() == path || f.starts_with(&format!("{path}/")))
            .cloned()
            .collect();
        for folder in doomed {
            inner.folders.remove(&folder);
        }
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let mut inner = self.inner.lock();
        inner.calls.push(format!("search:{}", query.expression));

        // The fake understands exactly the expression shape the adapter
        // builds: an optional `public_id:<dir>/*` clause.
        let dir = query
            .expression
            .split("public_id:")
            .nth(1)
            .and_then(|rest| rest.strip_suffix("/*"))
            .unwrap_or("");

        let mut matches: Vec<&StoredAsset> = inner
            .assets
            .values()
            .filter(|a| dir.is_empty() || a.public_id.starts_with(&format!("{dir}/")))
            .collect();
        matches.sort_by(|a, b| a.public_id.cmp(&b.public_id));

        let page_size = inner
            .search_page_size
            .unwrap_or(query.max_results as usize)
            .max(1);
        let offset: usize = query
            .cursor
            .as_deref()
            .map(|c| c.parse().unwrap_or(0))
            .unwrap_or(0);
        let end = (offset + page_size).min(matches.len());
        let next_cursor = (end < matches.len()).then(|| end.to_string());

        Ok(SearchPage {
            resources: matches[offset..end].iter().map(|a| a.descriptor()).collect(),
            next_cursor,
        })
    }
}

/// Fetcher resolving delivery URLs against the fake remote's state.
#[derive(Clone)]
pub struct FakeFetcher {
    remote: FakeRemote,
}

#[async_trait]
impl ByteFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.remote
            .fetch_payload(url)
            .ok_or_else(|| AssetFsError::NotFound(url.to_string()))
    }

    async fn fetch_stream(&self, url: &str) -> Result<ByteStream> {
        let bytes = self.fetch(url).await?;
        Ok(futures::stream::once(async move { Ok(bytes) }).boxed())
    }
}

/// Install the env-filter subscriber once so adapter logs surface under
/// `RUST_LOG` during test runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build an adapter over a fresh fake remote, returning a handle to the
/// remote for state assertions.
pub fn fixture() -> (AssetFsAdapter<FakeRemote>, FakeRemote) {
    fixture_with_config(AdapterConfig::new())
}

pub fn fixture_with_config(config: AdapterConfig) -> (AssetFsAdapter<FakeRemote>, FakeRemote) {
    init_tracing();
    let remote = FakeRemote::default();
    let fetcher = Arc::new(FakeFetcher {
        remote: remote.clone(),
    });
    let adapter = AssetFsAdapter::new(remote.clone(), config)
        .expect("valid config")
        .with_fetcher(fetcher)
        .with_logging(Some(Arc::new(TracingSink)))
        .expect("sink attached");
    (adapter, remote)
}
