//! Path and identifier model
//!
//! The remote store addresses assets by a public identifier inside a
//! resource-type namespace, not by filesystem path. These helpers derive
//! identifiers from logical paths and back. All functions are pure string
//! manipulation; identifiers are recomputed on every operation and never
//! cached.

use crate::resource::ResourceType;

/// Split a logical path into `(base_name, parent_dir)`.
///
/// Empty segments are discarded, so `"a//b/"` behaves like `"a/b"`.
/// `parent_dir` is `""` for top-level entries.
pub fn split_path(path: &str) -> (String, String) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.split_last() {
        Some((base, parents)) => (base.to_string(), parents.join("/")),
        None => (String::new(), String::new()),
    }
}

/// Normalize a path by dropping empty segments.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip the final extension from a file name, if any.
///
/// A leading dot (`.env`) is not treated as an extension separator.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Derive the remote public identifier for a path.
///
/// The extension is stripped unless the asset is `Raw`: raw assets have no
/// separate format field on the remote side, so the extension must stay
/// part of the identifier. Paths with no extension are unaffected either
/// way.
pub fn public_id(path: &str, resource_type: ResourceType) -> String {
    let normalized = normalize(path);
    match resource_type {
        ResourceType::Raw => normalized,
        ResourceType::Image | ResourceType::Video => {
            let (base, dir) = split_path(&normalized);
            let stem = strip_extension(&base);
            if dir.is_empty() {
                stem.to_string()
            } else {
                format!("{}/{}", dir, stem)
            }
        }
    }
}

/// Prefix applier/stripper for scoping the adapter to a sub-tree of the
/// remote store.
#[derive(Debug, Clone, Default)]
pub struct Prefixer {
    prefix: String,
}

impl Prefixer {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize(prefix),
        }
    }

    /// Apply the prefix to a logical path.
    pub fn apply(&self, path: &str) -> String {
        let path = normalize(path);
        if self.prefix.is_empty() {
            path
        } else if path.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, path)
        }
    }

    /// Remove the prefix from a remote path, yielding the logical path.
    ///
    /// Paths outside the prefix are returned unchanged.
    pub fn strip(&self, path: &str) -> String {
        let path = normalize(path);
        if self.prefix.is_empty() {
            return path;
        }
        if path == self.prefix {
            return String::new();
        }
        path.strip_prefix(&format!("{}/", self.prefix))
            .map(|p| p.to_string())
            .unwrap_or(path)
    }
}
