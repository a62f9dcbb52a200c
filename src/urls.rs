//! VK video URL recognition
//!
//! This module classifies arbitrary strings as VK video references. Three
//! surface grammars are accepted, reflecting the paste shapes users actually
//! encounter: a direct player URL, a canonical watch-page URL, and a deep
//! link carrying the reference as a query parameter.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The accepted VK video URL grammars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UrlKind {
    /// Direct player URL: `/video_ext.php?oid=<int>&id=<int>[&...]`
    PreCanonical,
    /// Canonical watch-page URL: `/video<owner>_<id>` plus optional path segments
    ShortForm,
    /// Deep link with the reference in a `z=` query parameter
    EmbeddedQuery,
}

/// A parsed video reference
///
/// A leading `-` on `owner_id` denotes a community/group owner, its absence
/// a user owner. The ids are carried verbatim as the validated digit runs
/// the pattern captured, so references of any length round-trip into the
/// builder unchanged. Only ever constructed from text that matched the
/// reference pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    /// Owner (user or community) id, an optionally signed digit run
    pub owner_id: String,
    /// Video id within the owner's namespace, a digit run
    pub video_id: String,
}

impl VideoRef {
    /// Extracts the first `video<owner>_<id>` reference from `text`
    ///
    /// Matching is case-insensitive. Returns `None` when no reference is
    /// present. Zero ids are valid; success is decided by capture presence,
    /// not numeric truthiness.
    pub fn extract(text: &str) -> Option<VideoRef> {
        static VIDEO_REF_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = VIDEO_REF_REGEX
            .get_or_init(|| Regex::new(r"(?i)video(-?\d+)_(-?\d+)").unwrap());

        let caps = re.captures(text)?;
        Some(VideoRef {
            owner_id: caps.get(1)?.as_str().to_string(),
            video_id: caps.get(2)?.as_str().to_string(),
        })
    }
}

/// Strips the scheme/`www.`/host prefix, returning the path+query remainder
///
/// The scheme is optional (`https:`, `http:`, or protocol-relative `//`), as
/// is `www.`. The host must be `vk.com` or `vkvideo.ru`, compared
/// case-insensitively. Returns `None` for any other host.
fn strip_host_prefix(text: &str) -> Option<&str> {
    static PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX_REGEX.get_or_init(|| {
        Regex::new(r"^(?i:(?:(?:https?:)?//)?(?:www\.)?(?:vk\.com|vkvideo\.ru))/")
            .unwrap()
    });

    re.find(text).map(|m| &text[m.end()..])
}

/// Matches the direct player form: `video_ext.php?oid=<int>&id=<int>[&...]`
fn matches_pre_canonical(rest: &str) -> bool {
    static PRE_CANONICAL_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = PRE_CANONICAL_REGEX.get_or_init(|| {
        Regex::new(r"^video_ext\.php\?oid=-?\d+&id=\d+(?:&\S*)?$").unwrap()
    });

    re.is_match(rest)
}

/// Matches the watch-page form: `video<owner>_<id>` plus optional segments
///
/// Each trailing path segment is restricted to word characters, `%`, and `-`.
fn matches_short_form(rest: &str) -> bool {
    static SHORT_FORM_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = SHORT_FORM_REGEX
        .get_or_init(|| Regex::new(r"^video-?\d+_\d+(?:/[\w%-]+)*$").unwrap());

    re.is_match(rest)
}

/// Matches a deep link whose query carries a `z=video<owner>_<id>` parameter
///
/// Any non-empty path is allowed before the `?`; the `z=` parameter may
/// appear anywhere in the query, with other parameters before or after.
fn matches_embedded_query(rest: &str) -> bool {
    static EMBEDDED_REF_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = EMBEDDED_REF_REGEX
        .get_or_init(|| Regex::new(r"\bz=video-?\d+_\d").unwrap());

    match rest.split_once('?') {
        Some((path, query)) => !path.is_empty() && !query.is_empty() && re.is_match(query),
        None => false,
    }
}

/// Classifies `text` as one of the accepted VK video URL grammars
///
/// The whole string must match; substrings of a larger text are not valid
/// top-level inputs. Returns `None` for empty or non-matching input.
pub fn classify(text: &str) -> Option<UrlKind> {
    let rest = strip_host_prefix(text)?;

    if matches_pre_canonical(rest) {
        Some(UrlKind::PreCanonical)
    } else if matches_short_form(rest) {
        Some(UrlKind::ShortForm)
    } else if matches_embedded_query(rest) {
        Some(UrlKind::EmbeddedQuery)
    } else {
        None
    }
}

/// Checks whether `text` is a VK video reference in any accepted grammar
pub fn is_valid_vk_video_url(text: &str) -> bool {
    classify(text).is_some()
}
