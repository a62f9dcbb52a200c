//! Embed URL construction
//!
//! This module turns a recognized VK video reference into the canonical
//! iframe-embeddable player URL, with optional playback parameters.

use crate::urls::{is_valid_vk_video_url, VideoRef};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Base URL of the VK video player
pub const EMBED_BASE_URL: &str = "https://vk.com/video_ext.php";

/// Errors that can occur while assembling an embed
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Not a recognizable VK video URL
    #[error("Invalid VK video URL: {0}")]
    InvalidUrl(String),

    /// No video reference found in the URL
    #[error("Missing video reference in URL")]
    MissingId,

    /// Timestamp does not match the `<n>h<n>m<n>s` form
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type for embed operations
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Player resolution tiers
///
/// The numeric code, not the pixel dimensions, is the wire value sent to
/// the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// 640x360
    Res640x360 = 1,
    /// 853x480
    Res853x480 = 2,
    /// 1280x720
    Res1280x720 = 3,
    /// 1920x1080
    Res1920x1080 = 4,
}

impl Resolution {
    /// Wire code for the `hd` query parameter
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Pixel dimensions of this tier
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::Res640x360 => (640, 360),
            Resolution::Res853x480 => (853, 480),
            Resolution::Res1280x720 => (1280, 720),
            Resolution::Res1920x1080 => (1920, 1080),
        }
    }
}

/// A playback start offset of the exact lexical form `<n>h<n>m<n>s`
///
/// Validated on construction and carried as an opaque string; the core never
/// decomposes it into numeric hours/minutes/seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timestamp(String);

impl Timestamp {
    /// Parses a timestamp, validating its lexical form
    pub fn parse(s: &str) -> Result<Timestamp> {
        static TIMESTAMP_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = TIMESTAMP_REGEX.get_or_init(|| Regex::new(r"^\d+h\d+m\d+s$").unwrap());

        if re.is_match(s) {
            Ok(Timestamp(s.to_string()))
        } else {
            Err(EmbedError::InvalidTimestamp(s.to_string()))
        }
    }

    /// The validated timestamp string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Timestamp {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Timestamp> {
        Timestamp::parse(s)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Options for building an embed URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedOptions {
    /// The VK video reference, in any accepted grammar
    pub url: String,
    /// Resolution tier for the `hd` parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd: Option<Resolution>,
    /// Playback start offset for the `t` parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
    /// Start playback immediately
    #[serde(default)]
    pub autoplay: bool,
    /// Restart playback when the video ends
    #[serde(default, rename = "loop")]
    pub loop_playback: bool,
    /// Enable the player's JavaScript API
    #[serde(default)]
    pub js_api: bool,
}

impl EmbedOptions {
    /// Creates options for `url` with every optional parameter absent
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hd: None,
            start: None,
            autoplay: false,
            loop_playback: false,
            js_api: false,
        }
    }

    /// Builds the canonical embed URL for these options
    pub fn embed_url(&self) -> Option<String> {
        build_embed_url(self)
    }
}

/// Builds the canonical iframe-embeddable URL for a VK video reference
///
/// Returns `None` when `options.url` is not a recognizable reference; see
/// [`try_build_embed_url`] for the reason. The `None` sentinel is the whole
/// failure channel of the builder contract.
pub fn build_embed_url(options: &EmbedOptions) -> Option<String> {
    try_build_embed_url(options).ok()
}

/// Builds the canonical embed URL, reporting why construction failed
///
/// A URL that is already in `/video_ext.php?` form is returned unchanged and
/// all other options are ignored, preserving the original extension's
/// pass-through behavior. Otherwise the owner and video ids are extracted
/// and reassembled onto the canonical player base URL, with query
/// parameters appended in fixed order: `oid`, `id`, then whichever of
/// `hd`, `t`, `autoplay`, `loop`, `js_api` are set.
pub fn try_build_embed_url(options: &EmbedOptions) -> Result<String> {
    if !is_valid_vk_video_url(&options.url) {
        return Err(EmbedError::InvalidUrl(options.url.clone()));
    }

    if options.url.contains("/video_ext.php?") {
        return Ok(options.url.clone());
    }

    let video = VideoRef::extract(&options.url).ok_or(EmbedError::MissingId)?;

    let mut url =
        Url::parse(EMBED_BASE_URL).map_err(|_| EmbedError::InvalidUrl(options.url.clone()))?;
    {
        let mut params = url.query_pairs_mut();
        params.append_pair("oid", &video.owner_id);
        params.append_pair("id", &video.video_id);

        if let Some(hd) = options.hd {
            params.append_pair("hd", &hd.code().to_string());
        }
        if let Some(start) = &options.start {
            params.append_pair("t", start.as_str());
        }
        if options.autoplay {
            params.append_pair("autoplay", "1");
        }
        if options.loop_playback {
            params.append_pair("loop", "1");
        }
        if options.js_api {
            params.append_pair("js_api", "1");
        }
    }

    Ok(url.into())
}
