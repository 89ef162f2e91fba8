//! Image path remediation for `file://` loading.
//!
//! The site publishes images under a root-relative prefix
//! (`/assets/images/...`). Served over HTTP that resolves against the site
//! root; loaded from disk it resolves against the filesystem root and
//! breaks. Every such `src` is rewritten to live next to the page instead.
//!
//! This is a fix for one known path convention, not a general resolver.

use crate::browser::{js_string, PageHandle, Script, ScriptKind};
use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// `window.location` pieces needed to rebuild an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageLocation {
    pub protocol: String,
    pub host: String,
    pub pathname: String,
}

/// One `<img>` as seen by the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageSource {
    /// Position in `document.querySelectorAll('img')`.
    pub index: usize,
    /// Resolved `img.src`.
    pub src: String,
    /// Literal `src` attribute, if any.
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageInventory {
    location: PageLocation,
    images: Vec<ImageSource>,
}

/// A rewrite to apply in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFix {
    pub index: usize,
    pub src: String,
}

/// Outcome of the remediation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReport {
    pub inspected: usize,
    pub rewritten: usize,
}

const INVENTORY_SCRIPT: &str = r#"
return {
  location: {
    protocol: window.location.protocol,
    host: window.location.host,
    pathname: window.location.pathname
  },
  images: Array.from(document.querySelectorAll('img')).map((img, index) => ({
    index,
    src: img.src || '',
    raw: img.getAttribute('src')
  }))
};
"#;

/// Absolute URL the image should load from, or `None` when it is fine as is.
///
/// A `file://` source counts as correct once it points into the prefix
/// directory next to the page. Matching the bare prefix would also accept
/// `file:///assets/images/...`, which is exactly the broken form.
pub fn corrected_source(
    location: &PageLocation,
    image: &ImageSource,
    prefix: &str,
) -> Option<String> {
    let base = location.pathname.replace("/index.html", "");
    if image.src.starts_with("file://") && image.src.contains(&format!("{base}{prefix}")) {
        return None;
    }
    let raw = image.raw.as_deref()?;
    if !raw.starts_with(prefix) {
        return None;
    }
    Some(format!("{}//{}{}{}", location.protocol, location.host, base, raw))
}

/// Script that applies `fixes` and returns how many images it touched.
pub fn rewrite_script(fixes: &[SourceFix]) -> Script {
    let payload = serde_json::to_string(fixes).unwrap_or_else(|_| "[]".to_string());
    Script::new(
        ScriptKind::RewriteImages,
        format!(
            "const fixes = JSON.parse({});\n\
             const images = document.querySelectorAll('img');\n\
             let applied = 0;\n\
             for (const fix of fixes) {{\n\
               const img = images[fix.index];\n\
               if (img) {{ img.src = fix.src; applied += 1; }}\n\
             }}\n\
             return applied;",
            js_string(&payload)
        ),
    )
}

/// Rewrite root-relative image sources under `prefix`.
pub fn remediate(page: &dyn PageHandle, prefix: &str) -> Result<AssetReport, ExportError> {
    let value = page.evaluate(&Script::new(ScriptKind::ImageSources, INVENTORY_SCRIPT))?;
    let inventory: ImageInventory = serde_json::from_value(value)
        .map_err(|e| ExportError::browser("image inventory", e))?;

    let fixes: Vec<SourceFix> = inventory
        .images
        .iter()
        .filter_map(|img| {
            let fixed = corrected_source(&inventory.location, img, prefix);
            match &fixed {
                Some(src) => info!("Fixing image path from {} to {}", img.src, src),
                None => debug!("Image src: {}", img.src),
            }
            fixed.map(|src| SourceFix {
                index: img.index,
                src,
            })
        })
        .collect();

    let rewritten = if fixes.is_empty() {
        0
    } else {
        page.evaluate(&rewrite_script(&fixes))?
            .as_u64()
            .unwrap_or(0) as usize
    };

    Ok(AssetReport {
        inspected: inventory.images.len(),
        rewritten,
    })
}
