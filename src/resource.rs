//! Resource-type classification
//!
//! Every asset in the remote store lives in exactly one of three
//! namespaces: image, video or raw. The classifier maps a detected mime
//! type onto one of them using ordered substring lists. Substring (not
//! exact) matching is deliberate: the mime detector does not cover every
//! remote-supported format (3D models, RAW photo, CAD), so partial tokens
//! catch whole families, and the lists are caller-replaceable so coverage
//! gaps can be corrected without forking the adapter. Misclassification
//! of an exotic format is expected and fixed via configuration, not a bug.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AssetFsError;

/// The remote store's resource-type partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [ResourceType::Image, ResourceType::Video, ResourceType::Raw];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AssetFsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(ResourceType::Image),
            "video" => Ok(ResourceType::Video),
            "raw" => Ok(ResourceType::Raw),
            other => Err(AssetFsError::Config(format!(
                "unknown resource type: {other}"
            ))),
        }
    }
}

/// Default image-class mime tokens.
///
/// `application/pdf` and `application/postscript` are image-class because
/// the remote store renders them through its image pipeline; `model/`
/// catches 3D formats it files under image as well.
const IMAGE_MATCHES: &[&str] = &[
    "image/",
    "application/pdf",
    "application/postscript",
    "application/vnd.adobe.photoshop",
    "model/",
];

const VIDEO_MATCHES: &[&str] = &["video/", "application/x-mpegurl", "application/mxf"];

/// Audio folds into the video namespace: the remote API only accepts audio
/// through its video upload pathway.
const AUDIO_MATCHES: &[&str] = &["audio/"];

/// Maps mime types to resource types via ordered substring lists.
#[derive(Debug, Clone)]
pub struct ResourceTypeClassifier {
    image_matches: Vec<String>,
    video_matches: Vec<String>,
    audio_matches: Vec<String>,
}

impl Default for ResourceTypeClassifier {
    fn default() -> Self {
        Self {
            image_matches: IMAGE_MATCHES.iter().map(|s| s.to_string()).collect(),
            video_matches: VIDEO_MATCHES.iter().map(|s| s.to_string()).collect(),
            audio_matches: AUDIO_MATCHES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ResourceTypeClassifier {
    /// Replace all three match lists wholesale.
    pub fn with_matches(
        image: Vec<String>,
        video: Vec<String>,
        audio: Vec<String>,
    ) -> Self {
        Self {
            image_matches: image,
            video_matches: video,
            audio_matches: audio,
        }
    }

    /// Classify a mime type. Lists are checked image, then video, then
    /// audio; the first list containing a matching token wins. No match,
    /// or no mime type at all, lands in `Raw`.
    pub fn classify(&self, mime_type: Option<&str>) -> ResourceType {
        let Some(mime) = mime_type else {
            return ResourceType::Raw;
        };
        if Self::matches(&self.image_matches, mime) {
            ResourceType::Image
        } else if Self::matches(&self.video_matches, mime) || Self::matches(&self.audio_matches, mime)
        {
            ResourceType::Video
        } else {
            ResourceType::Raw
        }
    }

    fn matches(tokens: &[String], mime: &str) -> bool {
        tokens.iter().any(|t| mime.contains(t.as_str()))
    }
}
