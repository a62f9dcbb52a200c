//! VK video embeds for rich-text documents
//!
//! This crate recognizes VK (vk.com / vkvideo.ru) video URLs in the surface
//! forms users paste, normalizes them into canonical iframe-embeddable
//! player URLs, and provides the editor-extension surface (node attributes,
//! insertion command, paste rule, HTML serialization) around that core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod embed;
pub mod extension;
pub mod urls;

pub use embed::{build_embed_url, EmbedOptions, Resolution, Timestamp};
pub use extension::{VkVideo, VkVideoAttrs, VkVideoOptions};
pub use urls::{is_valid_vk_video_url, UrlKind, VideoRef};
