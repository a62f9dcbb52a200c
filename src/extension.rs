//! Editor integration for VK video nodes
//!
//! A framework-agnostic rendition of the editor extension surface: node
//! options and attributes, the insertion command, paste interception, and
//! HTML serialization. The host editor owns layout, persistence, undo, and
//! collaboration; this layer only decides what a VK video node is and how
//! its markup is produced.

use crate::embed::{build_embed_url, EmbedOptions, Resolution, Timestamp};
use crate::urls::is_valid_vk_video_url;
use serde::{Deserialize, Serialize};

/// Name of the document node type
pub const NODE_NAME: &str = "vkVideo";

/// HTML selector the host editor uses to re-parse serialized nodes
pub const PARSE_RULES: &[&str] = &["div[data-vk-video] iframe"];

/// Extension-level configuration for VK video nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VkVideoOptions {
    /// Whether pasted VK video URLs are converted into nodes
    pub add_paste_handler: bool,
    /// Default frame width in pixels
    pub width: u32,
    /// Default frame height in pixels
    pub height: u32,
    /// Video quality sent to the player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd: Option<Resolution>,
    /// Whether playback starts immediately
    pub autoplay: bool,
    /// Whether playback restarts when the video ends
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    /// Whether the player's JavaScript API is enabled
    pub js_api: bool,
    /// Whether the node is inline rather than block-level
    pub inline: bool,
    /// Whether the frame may go fullscreen
    pub allow_fullscreen: bool,
    /// Extra attributes rendered onto the frame
    pub html_attributes: Vec<(String, String)>,
}

impl Default for VkVideoOptions {
    fn default() -> Self {
        Self {
            add_paste_handler: true,
            width: 640,
            height: 480,
            hd: None,
            autoplay: false,
            loop_playback: false,
            js_api: false,
            inline: false,
            allow_fullscreen: true,
            html_attributes: Vec::new(),
        }
    }
}

/// Attributes carried by a single VK video node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VkVideoAttrs {
    /// The VK video reference as pasted or inserted
    pub src: String,
    /// Frame width override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Playback start offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
}

impl VkVideoAttrs {
    /// Creates attributes for `src` with no overrides
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into(), width: None, height: None, start: None }
    }
}

/// Input for the insertion command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVkVideoOptions {
    /// The VK video reference to insert
    pub src: String,
    /// Frame width override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Playback start offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
}

/// The VK video editor extension
///
/// # Example
///
/// ```
/// use vk_video_embed::extension::{SetVkVideoOptions, VkVideo};
///
/// let extension = VkVideo::default();
/// let node = extension.set_vk_video(SetVkVideoOptions {
///     src: "https://vk.com/video-197013187_456239246".to_string(),
///     width: None,
///     height: None,
///     start: None,
/// });
/// assert!(node.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VkVideo {
    options: VkVideoOptions,
}

impl VkVideo {
    /// Creates the extension with the given options
    pub fn new(options: VkVideoOptions) -> Self {
        Self { options }
    }

    /// The extension options
    pub fn options(&self) -> &VkVideoOptions {
        &self.options
    }

    /// The document node type name
    pub fn node_name(&self) -> &'static str {
        NODE_NAME
    }

    /// The node group: `"inline"` or `"block"` per the `inline` option
    pub fn group(&self) -> &'static str {
        if self.options.inline {
            "inline"
        } else {
            "block"
        }
    }

    /// Whether the node can be dragged within the document
    pub fn draggable(&self) -> bool {
        true
    }

    /// HTML selectors for re-parsing serialized nodes
    pub fn parse_rules(&self) -> &'static [&'static str] {
        PARSE_RULES
    }

    /// The insertion command: validates the reference and produces a node
    ///
    /// Returns `None` when `src` is not a recognizable VK video URL, which
    /// rejects the command.
    pub fn set_vk_video(&self, options: SetVkVideoOptions) -> Option<VkVideoAttrs> {
        if !is_valid_vk_video_url(&options.src) {
            return None;
        }

        Some(VkVideoAttrs {
            src: options.src,
            width: options.width,
            height: options.height,
            start: options.start,
        })
    }

    /// Paste interception: converts a pasted span into a node
    ///
    /// The whole span must be a recognized reference; the matched span
    /// becomes the node's `src` attribute. Returns `None` when the paste
    /// handler is disabled or the span does not match.
    pub fn paste_rule(&self, pasted: &str) -> Option<VkVideoAttrs> {
        if !self.options.add_paste_handler {
            return None;
        }

        if !is_valid_vk_video_url(pasted) {
            return None;
        }

        tracing::debug!("converting pasted VK video URL into a node: {}", pasted);
        Some(VkVideoAttrs::new(pasted))
    }

    /// HTML serialization: renders a node as `div[data-vk-video] > iframe`
    ///
    /// The frame `src` is computed from the node's reference and start
    /// offset plus the extension-level playback options. The `start`
    /// attribute is also serialized onto the frame so the parse rules can
    /// recover it. Configured extra attributes never override the built-in
    /// ones; colliding names are skipped. When the reference cannot be
    /// converted the frame is emitted with an empty `src`; fallback behavior
    /// is the host's concern.
    pub fn render_html(&self, attrs: &VkVideoAttrs) -> String {
        let src = build_embed_url(&EmbedOptions {
            url: attrs.src.clone(),
            hd: self.options.hd,
            start: attrs.start.clone(),
            autoplay: self.options.autoplay,
            loop_playback: self.options.loop_playback,
            js_api: self.options.js_api,
        })
        .unwrap_or_default();

        let mut html = String::from("<div data-vk-video=\"\"><iframe");

        for (name, value) in &self.options.html_attributes {
            if RESERVED_ATTRS.iter().any(|r| r.eq_ignore_ascii_case(name)) {
                continue;
            }
            push_attr(&mut html, name, value);
        }

        let width = attrs.width.unwrap_or(self.options.width);
        let height = attrs.height.unwrap_or(self.options.height);
        push_attr(&mut html, "width", &width.to_string());
        push_attr(&mut html, "height", &height.to_string());

        if self.options.allow_fullscreen {
            push_attr(&mut html, "allowfullscreen", "");
        }
        push_attr(&mut html, "frameborder", "0");
        push_attr(&mut html, "src", &src);
        if let Some(start) = &attrs.start {
            push_attr(&mut html, "start", start.as_str());
        }

        html.push_str("></iframe></div>");
        html
    }
}

/// Frame attributes owned by the renderer; configured extras may not shadow them
const RESERVED_ATTRS: &[&str] =
    &["width", "height", "allowfullscreen", "frameborder", "src", "start"];

/// Appends ` name="value"` with the value HTML-escaped
fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

/// Escapes a string for use inside a double-quoted HTML attribute
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_options(src: &str) -> SetVkVideoOptions {
        SetVkVideoOptions { src: src.to_string(), width: None, height: None, start: None }
    }

    #[test]
    fn test_default_options() {
        let options = VkVideoOptions::default();
        assert!(options.add_paste_handler);
        assert_eq!(options.width, 640);
        assert_eq!(options.height, 480);
        assert!(options.hd.is_none());
        assert!(!options.autoplay);
        assert!(!options.loop_playback);
        assert!(!options.js_api);
        assert!(!options.inline);
        assert!(options.allow_fullscreen);
        assert!(options.html_attributes.is_empty());
    }

    #[test]
    fn test_node_name_and_group() {
        let extension = VkVideo::default();
        assert_eq!(extension.node_name(), "vkVideo");
        assert_eq!(extension.group(), "block");
        assert!(extension.draggable());

        let inline = VkVideo::new(VkVideoOptions { inline: true, ..Default::default() });
        assert_eq!(inline.group(), "inline");
    }

    #[test]
    fn test_parse_rules() {
        let extension = VkVideo::default();
        assert_eq!(extension.parse_rules(), ["div[data-vk-video] iframe"]);
    }

    #[test]
    fn test_set_vk_video_valid() {
        let extension = VkVideo::default();
        let node = extension
            .set_vk_video(set_options("https://vk.com/video-197013187_456239246"))
            .unwrap();
        assert_eq!(node.src, "https://vk.com/video-197013187_456239246");
        assert!(node.width.is_none());
    }

    #[test]
    fn test_set_vk_video_rejects_invalid() {
        let extension = VkVideo::default();
        assert!(extension.set_vk_video(set_options("https://example.com/video-1_2")).is_none());
        assert!(extension.set_vk_video(set_options("")).is_none());
    }

    #[test]
    fn test_set_vk_video_keeps_overrides() {
        let extension = VkVideo::default();
        let node = extension
            .set_vk_video(SetVkVideoOptions {
                src: "https://vk.com/video-1_2".to_string(),
                width: Some(1280),
                height: Some(720),
                start: Some(Timestamp::parse("0h0m10s").unwrap()),
            })
            .unwrap();
        assert_eq!(node.width, Some(1280));
        assert_eq!(node.height, Some(720));
        assert_eq!(node.start.unwrap().as_str(), "0h0m10s");
    }

    #[test]
    fn test_paste_rule_matches_whole_span() {
        let extension = VkVideo::default();
        let node = extension.paste_rule("https://vk.com/video-1_2").unwrap();
        assert_eq!(node.src, "https://vk.com/video-1_2");
    }

    #[test]
    fn test_paste_rule_rejects_surrounding_text() {
        let extension = VkVideo::default();
        assert!(extension.paste_rule("watch this https://vk.com/video-1_2").is_none());
    }

    #[test]
    fn test_paste_rule_disabled() {
        let extension =
            VkVideo::new(VkVideoOptions { add_paste_handler: false, ..Default::default() });
        assert!(extension.paste_rule("https://vk.com/video-1_2").is_none());
    }

    #[test]
    fn test_render_html_defaults() {
        let extension = VkVideo::default();
        let html = extension.render_html(&VkVideoAttrs::new("https://vk.com/video-1_2"));
        assert_eq!(
            html,
            "<div data-vk-video=\"\"><iframe width=\"640\" height=\"480\" \
             allowfullscreen=\"\" frameborder=\"0\" \
             src=\"https://vk.com/video_ext.php?oid=-1&amp;id=2\"></iframe></div>"
        );
    }

    #[test]
    fn test_render_html_node_overrides_dimensions() {
        let extension = VkVideo::default();
        let mut attrs = VkVideoAttrs::new("https://vk.com/video-1_2");
        attrs.width = Some(1280);
        attrs.height = Some(720);
        let html = extension.render_html(&attrs);
        assert!(html.contains("width=\"1280\""));
        assert!(html.contains("height=\"720\""));
    }

    #[test]
    fn test_render_html_applies_extension_playback_options() {
        let extension = VkVideo::new(VkVideoOptions {
            hd: Some(Resolution::Res1280x720),
            autoplay: true,
            loop_playback: true,
            js_api: true,
            ..Default::default()
        });
        let mut attrs = VkVideoAttrs::new("https://vk.com/video-1_2");
        attrs.start = Some(Timestamp::parse("0h1m30s").unwrap());
        let html = extension.render_html(&attrs);
        assert!(html.contains(
            "src=\"https://vk.com/video_ext.php?oid=-1&amp;id=2&amp;hd=3&amp;t=0h1m30s\
             &amp;autoplay=1&amp;loop=1&amp;js_api=1\""
        ));
    }

    #[test]
    fn test_render_html_no_fullscreen() {
        let extension =
            VkVideo::new(VkVideoOptions { allow_fullscreen: false, ..Default::default() });
        let html = extension.render_html(&VkVideoAttrs::new("https://vk.com/video-1_2"));
        assert!(!html.contains("allowfullscreen"));
    }

    #[test]
    fn test_render_html_extra_attributes() {
        let extension = VkVideo::new(VkVideoOptions {
            html_attributes: vec![("class".to_string(), "player".to_string())],
            ..Default::default()
        });
        let html = extension.render_html(&VkVideoAttrs::new("https://vk.com/video-1_2"));
        assert!(html.contains("class=\"player\""));
    }

    #[test]
    fn test_render_html_serializes_start_attribute() {
        let extension = VkVideo::default();
        let mut attrs = VkVideoAttrs::new("https://vk.com/video-1_2");
        attrs.start = Some(Timestamp::parse("0h1m30s").unwrap());
        let html = extension.render_html(&attrs);
        // The offset is folded into the src and kept as its own attribute
        // so re-parsing through the parse rules recovers it
        assert!(html.contains("t=0h1m30s"));
        assert!(html.contains(" start=\"0h1m30s\""));
    }

    #[test]
    fn test_render_html_reserved_names_cannot_be_shadowed() {
        let extension = VkVideo::new(VkVideoOptions {
            html_attributes: vec![
                ("src".to_string(), "https://evil.example".to_string()),
                ("WIDTH".to_string(), "9999".to_string()),
                ("class".to_string(), "player".to_string()),
            ],
            ..Default::default()
        });
        let html = extension.render_html(&VkVideoAttrs::new("https://vk.com/video-1_2"));
        assert!(!html.contains("evil.example"));
        assert!(!html.contains("9999"));
        assert_eq!(html.matches("width=").count(), 1);
        assert_eq!(html.matches("src=").count(), 1);
        assert!(html.contains("class=\"player\""));
        assert!(html.contains("width=\"640\""));
    }

    #[test]
    fn test_render_html_unbuildable_src_is_empty() {
        // set_vk_video gates insertion, but attributes can arrive from
        // deserialized documents; the renderer must not panic on them
        let extension = VkVideo::default();
        let html = extension.render_html(&VkVideoAttrs::new("https://example.com/video-1_2"));
        assert!(html.contains("src=\"\""));
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("a&b<c>\"d\""), "a&amp;b&lt;c&gt;&quot;d&quot;");
        assert_eq!(escape_attr("plain"), "plain");
    }

    #[test]
    fn test_attrs_serialization() {
        let mut attrs = VkVideoAttrs::new("https://vk.com/video-1_2");
        attrs.start = Some(Timestamp::parse("0h1m30s").unwrap());
        let json = serde_json::to_string(&attrs).unwrap();
        assert!(json.contains("\"src\":\"https://vk.com/video-1_2\""));
        assert!(json.contains("\"start\":\"0h1m30s\""));
        assert!(!json.contains("width"));

        let back: VkVideoAttrs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }
}
