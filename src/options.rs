//! Per-call write/move options
//!
//! A structured rendition of the remote upload API's option bag: every
//! recognized option is a named field, and `passthrough` carries anything
//! else verbatim to the remote call as a forward-compatibility escape
//! hatch. Options are read per operation and never persisted.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::resource::ResourceType;
use crate::visibility::{UploadType, Visibility};

/// Options accepted by the write, move and copy operations.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Force the resource-type namespace instead of classifying the mime
    /// type.
    pub resource_type: Option<ResourceType>,
    /// Override the derived public identifier.
    pub public_id: Option<String>,
    /// Override the upload access type; wins over `visibility`.
    pub upload_type: Option<UploadType>,
    /// Desired visibility, converted to an upload type.
    pub visibility: Option<Visibility>,
    /// Target access type for a move.
    pub to_type: Option<UploadType>,
    /// Upload preset; wins over the configured default.
    pub upload_preset: Option<String>,
    pub invalidate: Option<bool>,
    pub overwrite: Option<bool>,

    // Optional-feature parameters forwarded on image/video uploads.
    pub access_mode: Option<String>,
    pub access_control: Option<Value>,
    pub phash: Option<bool>,
    pub metadata: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub context: Option<Value>,
    pub backup: Option<bool>,
    pub responsive_breakpoints: Option<Value>,
    pub auto_tagging: Option<f64>,
    pub categorization: Option<String>,
    pub detection: Option<String>,
    pub auto_chaptering: Option<bool>,
    pub auto_transcription: Option<bool>,
    pub ocr: Option<String>,
    pub visual_search: Option<bool>,
    pub eager: Option<Value>,
    pub transformation: Option<Value>,
    pub format: Option<String>,
    pub custom_coordinates: Option<String>,
    pub regions: Option<Value>,
    pub face_coordinates: Option<String>,
    pub background_removal: Option<String>,
    pub headers: Option<Value>,

    /// Unrecognized options, passed through to the remote call verbatim.
    pub passthrough: BTreeMap<String, Value>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_upload_type(mut self, upload_type: UploadType) -> Self {
        self.upload_type = Some(upload_type);
        self
    }

    pub fn with_upload_preset(mut self, preset: impl Into<String>) -> Self {
        self.upload_preset = Some(preset.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_passthrough(mut self, key: impl Into<String>, value: Value) -> Self {
        self.passthrough.insert(key.into(), value);
        self
    }

    /// Assemble the optional-feature parameter map forwarded on image and
    /// video uploads. Raw uploads skip these; the remote API rejects most
    /// of them outside the media pipelines.
    pub fn media_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(v) = value {
                params.insert(key.to_string(), v);
            }
        };

        put("access_mode", self.access_mode.clone().map(Value::from));
        put("access_control", self.access_control.clone());
        put("phash", self.phash.map(Value::from));
        put("metadata", self.metadata.clone());
        put(
            "tags",
            self.tags.as_ref().map(|t| Value::from(t.join(","))),
        );
        put("context", self.context.clone());
        put("backup", self.backup.map(Value::from));
        put("responsive_breakpoints", self.responsive_breakpoints.clone());
        put("auto_tagging", self.auto_tagging.map(Value::from));
        put("categorization", self.categorization.clone().map(Value::from));
        put("detection", self.detection.clone().map(Value::from));
        put("auto_chaptering", self.auto_chaptering.map(Value::from));
        put("auto_transcription", self.auto_transcription.map(Value::from));
        put("ocr", self.ocr.clone().map(Value::from));
        put("visual_search", self.visual_search.map(Value::from));
        put("eager", self.eager.clone());
        put("transformation", self.transformation.clone());
        put("format", self.format.clone().map(Value::from));
        put(
            "custom_coordinates",
            self.custom_coordinates.clone().map(Value::from),
        );
        put("regions", self.regions.clone());
        put(
            "face_coordinates",
            self.face_coordinates.clone().map(Value::from),
        );
        put(
            "background_removal",
            self.background_removal.clone().map(Value::from),
        );
        put("headers", self.headers.clone());

        params
    }

    /// The passthrough map as remote parameters.
    pub fn passthrough_params(&self) -> Map<String, Value> {
        self.passthrough
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_params_only_set_fields() {
        let opts = WriteOptions::new()
            .with_tags(vec!["a".into(), "b".into()]);
        let params = opts.media_params();
        assert_eq!(params.get("tags"), Some(&json!("a,b")));
        assert!(!params.contains_key("eager"));
        assert!(!params.contains_key("phash"));
    }

    #[test]
    fn test_media_params_feature_values() {
        let opts = WriteOptions {
            phash: Some(true),
            auto_tagging: Some(0.7),
            eager: Some(json!([{ "width": 100 }])),
            ..Default::default()
        };
        let params = opts.media_params();
        assert_eq!(params.get("phash"), Some(&json!(true)));
        assert_eq!(params.get("auto_tagging"), Some(&json!(0.7)));
        assert_eq!(params.get("eager"), Some(&json!([{ "width": 100 }])));
    }

    #[test]
    fn test_passthrough_preserved_verbatim() {
        let opts = WriteOptions::new()
            .with_passthrough("quality_analysis", json!(true))
            .with_passthrough("folder_decoupling", json!("enabled"));
        let params = opts.passthrough_params();
        assert_eq!(params.get("quality_analysis"), Some(&json!(true)));
        assert_eq!(params.get("folder_decoupling"), Some(&json!("enabled")));
    }
}
