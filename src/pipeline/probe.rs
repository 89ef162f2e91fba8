//! Post-load probes: is the page visually complete?
//!
//! Two things commonly go wrong when the built site is opened from disk:
//! the profile picture fails to decode, and the site stylesheet never
//! attaches. The first is patched with a generated placeholder; the second
//! is only diagnosed here, since print styles are injected unconditionally
//! afterwards.

use crate::browser::{js_string, PageHandle, Script, ScriptKind};
use crate::config::PlaceholderStyle;
use crate::error::ExportError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ── Profile image ────────────────────────────────────────────────────────

/// What the avatar probe found.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AvatarState {
    pub found: bool,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub natural_width: u32,
    #[serde(default)]
    pub natural_height: u32,
}

impl AvatarState {
    /// Not finished loading, or finished without decodable pixels.
    pub fn is_broken(&self) -> bool {
        self.found && (!self.complete || self.natural_width == 0)
    }
}

/// Outcome of the completeness probe, reported in [`crate::ExportReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileImageStatus {
    /// No element matched the avatar selector.
    Missing,
    /// The image decoded normally.
    Loaded { width: u32, height: u32 },
    /// The image was broken and replaced with generated initials.
    Placeholder,
    /// The probe itself failed; nothing was changed.
    Unknown,
}

fn avatar_script(selector: &str) -> Script {
    Script::new(
        ScriptKind::AvatarProbe,
        format!(
            "const avatar = document.querySelector({});\n\
             if (!avatar) return {{ found: false }};\n\
             return {{\n\
               found: true,\n\
               src: avatar.currentSrc || avatar.src || '',\n\
               complete: avatar.complete,\n\
               natural_width: avatar.naturalWidth,\n\
               natural_height: avatar.naturalHeight\n\
             }};",
            js_string(selector)
        ),
    )
}

fn replace_avatar_script(selector: &str, data_url: &str) -> Script {
    Script::new(
        ScriptKind::ReplaceAvatar,
        format!(
            "const avatar = document.querySelector({});\n\
             if (!avatar) return false;\n\
             avatar.src = {};\n\
             return true;",
            js_string(selector),
            js_string(data_url)
        ),
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// SVG of a solid square with centred initials.
pub fn placeholder_svg(style: &PlaceholderStyle) -> String {
    let size = style.size;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 {s} {s}">"#,
            r#"<rect width="{s}" height="{s}" fill="{bg}"/>"#,
            r#"<text x="{cx}" y="{baseline}" font-family="{font}" font-size="{fs}" fill="{fg}" text-anchor="middle">{initials}</text>"#,
            "</svg>"
        ),
        s = size,
        bg = xml_escape(&style.background),
        cx = size / 2,
        baseline = size * 3 / 5,
        font = xml_escape(&style.font_family),
        fs = style.font_size_px,
        fg = xml_escape(&style.foreground),
        initials = xml_escape(&style.initials),
    )
}

/// `data:` URL of [`placeholder_svg`].
pub fn placeholder_data_url(style: &PlaceholderStyle) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(placeholder_svg(style))
    )
}

/// Inspect the avatar and swap in a placeholder when it failed to decode.
pub fn probe_avatar(
    page: &dyn PageHandle,
    selector: &str,
    placeholder: &PlaceholderStyle,
) -> Result<ProfileImageStatus, ExportError> {
    let state: AvatarState = serde_json::from_value(page.evaluate(&avatar_script(selector))?)
        .map_err(|e| ExportError::browser("avatar probe", e))?;

    if !state.found {
        info!("No avatar element found for {selector}");
        return Ok(ProfileImageStatus::Missing);
    }
    debug!(
        "Avatar src: {} complete: {} naturalWidth: {}",
        state.src, state.complete, state.natural_width
    );

    if !state.is_broken() {
        info!(
            "Profile image loaded: {}x{}",
            state.natural_width, state.natural_height
        );
        return Ok(ProfileImageStatus::Loaded {
            width: state.natural_width,
            height: state.natural_height,
        });
    }

    warn!("Profile image failed to load ({}), generating placeholder", state.src);
    let replaced = page.evaluate(&replace_avatar_script(
        selector,
        &placeholder_data_url(placeholder),
    ))?;
    if replaced.as_bool() == Some(true) {
        Ok(ProfileImageStatus::Placeholder)
    } else {
        // The element vanished between the two scripts.
        Ok(ProfileImageStatus::Missing)
    }
}

// ── Native styles ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LayoutStyle {
    pub found: bool,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub background_color: String,
}

impl LayoutStyle {
    /// A grid container or any painted background means site CSS applied.
    pub fn styles_applied(&self) -> bool {
        self.found && (self.display == "grid" || self.background_color != "rgba(0, 0, 0, 0)")
    }
}

/// A `<link rel="stylesheet">` and whether its sheet attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylesheetStatus {
    pub href: String,
    pub loaded: bool,
}

/// Result of the style probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleReport {
    pub applied: bool,
    /// Only collected when styles did not apply.
    pub stylesheets: Vec<StylesheetStatus>,
}

impl StyleReport {
    /// One-line description of the stylesheet links, for warnings.
    pub fn describe_stylesheets(&self) -> String {
        if self.stylesheets.is_empty() {
            return "no stylesheet links found".to_string();
        }
        let links: Vec<String> = self
            .stylesheets
            .iter()
            .map(|s| {
                let state = if s.loaded { "loaded" } else { "not loaded" };
                format!("{} ({state})", s.href)
            })
            .collect();
        format!("stylesheets: {}", links.join(", "))
    }
}

fn layout_style_script(selector: &str) -> Script {
    Script::new(
        ScriptKind::StyleProbe,
        format!(
            "const el = document.querySelector({});\n\
             if (!el) return {{ found: false }};\n\
             const styles = window.getComputedStyle(el);\n\
             return {{\n\
               found: true,\n\
               display: styles.display,\n\
               background_color: styles.backgroundColor\n\
             }};",
            js_string(selector)
        ),
    )
}

const STYLESHEETS_SCRIPT: &str = r#"
return Array.from(document.querySelectorAll('link[rel="stylesheet"]')).map(link => ({
  href: link.href,
  loaded: link.sheet !== null
}));
"#;

/// Check whether site CSS applied to the layout container.
///
/// Diagnostic only: the result is logged and reported, never acted on.
pub fn probe_styles(page: &dyn PageHandle, selector: &str) -> Result<StyleReport, ExportError> {
    let layout: LayoutStyle = serde_json::from_value(page.evaluate(&layout_style_script(selector))?)
        .map_err(|e| ExportError::browser("style probe", e))?;
    debug!(
        "Layout display: {} background: {}",
        layout.display, layout.background_color
    );

    if layout.styles_applied() {
        info!("CSS loaded status: Styles applied");
        return Ok(StyleReport {
            applied: true,
            stylesheets: Vec::new(),
        });
    }

    warn!("CSS not loading properly, checking for stylesheet links...");
    let stylesheets: Vec<StylesheetStatus> = serde_json::from_value(
        page.evaluate(&Script::new(ScriptKind::ListStylesheets, STYLESHEETS_SCRIPT))?,
    )
    .map_err(|e| ExportError::browser("stylesheet listing", e))?;
    warn!(
        "Stylesheets found: {}",
        serde_json::to_string_pretty(&stylesheets).unwrap_or_default()
    );

    Ok(StyleReport {
        applied: false,
        stylesheets,
    })
}
