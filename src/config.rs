//! Configuration types for exporting the site to PDF.
//!
//! All export behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. The defaults reproduce the fixed behaviour of the
//! site's print job exactly: `_site/index.html` in, an A4 PDF at
//! `assets/pdf/cv-keg-dev-print.pdf` out, 0.4in margins at 0.75 scale.
//!
//! Earlier print scripts differed only in settle timings, margin, scale and
//! the injected stylesheet. Those are knobs here rather than separate code
//! paths.

use crate::error::ExportError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Built-in print stylesheet, injected after the page has loaded.
pub const DEFAULT_PRINT_STYLESHEET: &str = include_str!("../assets/print.css");

/// Configuration for a single export run.
///
/// Built via [`ExportConfig::builder()`] or using [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use cv_export::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .input_path("public/index.html")
///     .scale(0.8)
///     .margin_inches(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.layout.scale, 0.8);
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Built site entry page. Default: `_site/index.html`.
    pub input_path: PathBuf,

    /// Where the PDF is written. Default: `assets/pdf/cv-keg-dev-print.pdf`.
    pub output_path: PathBuf,

    /// Full-page snapshot taken right after the print styles are injected.
    pub debug_screenshot_path: PathBuf,

    /// Full-page snapshot taken after the style settle delay.
    pub debug_styled_screenshot_path: PathBuf,

    /// Write the two debug snapshots. Default: true.
    pub capture_debug_screenshots: bool,

    /// Minimum character count of the entry page. Default: 100.
    ///
    /// Anything shorter is a failed or truncated site build, not a résumé.
    pub min_input_chars: usize,

    /// Minimum size of the written PDF in bytes. Default: 1000.
    pub min_output_bytes: u64,

    /// Navigation timeout in seconds. Default: 60.
    pub navigation_timeout_secs: u64,

    /// Wait after fixing image sources before probing the avatar. Default: 3000.
    pub image_settle_ms: u64,

    /// Wait between the two debug snapshots for injected styles to apply. Default: 3000.
    pub style_settle_ms: u64,

    /// Browser viewport used for layout and screenshots.
    pub viewport: Viewport,

    /// Paper, margins and scale of the exported document.
    pub layout: PdfLayout,

    /// CSS injected before export. Default: [`DEFAULT_PRINT_STYLESHEET`].
    pub print_stylesheet: String,

    /// Path prefix that site images are published under. Default: `/assets/images/`.
    pub asset_prefix: String,

    /// Selector of the profile picture. Default: `.avatar`.
    pub avatar_selector: String,

    /// Selector of the grid container used to detect whether site CSS loaded.
    /// Default: `.wrapper`.
    pub layout_selector: String,

    /// Replacement drawn when the profile picture fails to decode.
    pub placeholder: PlaceholderStyle,

    /// How the browser process is launched.
    pub browser: BrowserSettings,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("_site/index.html"),
            output_path: PathBuf::from("assets/pdf/cv-keg-dev-print.pdf"),
            debug_screenshot_path: PathBuf::from("debug-screenshot.png"),
            debug_styled_screenshot_path: PathBuf::from("debug-screenshot-styled.png"),
            capture_debug_screenshots: true,
            min_input_chars: 100,
            min_output_bytes: 1000,
            navigation_timeout_secs: 60,
            image_settle_ms: 3000,
            style_settle_ms: 3000,
            viewport: Viewport::default(),
            layout: PdfLayout::default(),
            print_stylesheet: DEFAULT_PRINT_STYLESHEET.to_string(),
            asset_prefix: "/assets/images/".to_string(),
            avatar_selector: ".avatar".to_string(),
            layout_selector: ".wrapper".to_string(),
            placeholder: PlaceholderStyle::default(),
            browser: BrowserSettings::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("capture_debug_screenshots", &self.capture_debug_screenshots)
            .field("min_input_chars", &self.min_input_chars)
            .field("min_output_bytes", &self.min_output_bytes)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("image_settle_ms", &self.image_settle_ms)
            .field("style_settle_ms", &self.style_settle_ms)
            .field("viewport", &self.viewport)
            .field("layout", &self.layout)
            .field("print_stylesheet", &format!("<{} bytes>", self.print_stylesheet.len()))
            .field("browser", &self.browser)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn image_settle(&self) -> Duration {
        Duration::from_millis(self.image_settle_ms)
    }

    pub fn style_settle(&self) -> Duration {
        Duration::from_millis(self.style_settle_ms)
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_path = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    /// Set both debug snapshot paths at once.
    pub fn debug_screenshot_paths(
        mut self,
        before: impl Into<PathBuf>,
        styled: impl Into<PathBuf>,
    ) -> Self {
        self.config.debug_screenshot_path = before.into();
        self.config.debug_styled_screenshot_path = styled.into();
        self
    }

    pub fn capture_debug_screenshots(mut self, v: bool) -> Self {
        self.config.capture_debug_screenshots = v;
        self
    }

    pub fn min_input_chars(mut self, n: usize) -> Self {
        self.config.min_input_chars = n;
        self
    }

    pub fn min_output_bytes(mut self, n: u64) -> Self {
        self.config.min_output_bytes = n;
        self
    }

    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.navigation_timeout_secs = secs;
        self
    }

    pub fn image_settle_ms(mut self, ms: u64) -> Self {
        self.config.image_settle_ms = ms;
        self
    }

    pub fn style_settle_ms(mut self, ms: u64) -> Self {
        self.config.style_settle_ms = ms;
        self
    }

    /// Set both settle delays to the same value.
    pub fn settle_ms(self, ms: u64) -> Self {
        self.image_settle_ms(ms).style_settle_ms(ms)
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.config.viewport = viewport;
        self
    }

    pub fn paper(mut self, paper: PaperSize) -> Self {
        self.config.layout.paper = paper;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.config.layout.scale = scale;
        self
    }

    /// Uniform margin on all four sides, in inches.
    pub fn margin_inches(mut self, inches: f64) -> Self {
        self.config.layout.margin_inches = inches;
        self
    }

    pub fn print_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.config.print_stylesheet = css.into();
        self
    }

    pub fn asset_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.asset_prefix = prefix.into();
        self
    }

    pub fn avatar_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.avatar_selector = selector.into();
        self
    }

    pub fn layout_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.layout_selector = selector.into();
        self
    }

    pub fn placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.config.placeholder = placeholder;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser.chrome_path = Some(path.into());
        self
    }

    pub fn browser(mut self, browser: BrowserSettings) -> Self {
        self.config.browser = browser;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        let c = &self.config;
        // Chromium rejects print scales outside this range.
        if !(0.1..=2.0).contains(&c.layout.scale) {
            return Err(ExportError::InvalidConfig(format!(
                "scale must be 0.1–2.0, got {}",
                c.layout.scale
            )));
        }
        let (paper_w, paper_h) = c.layout.paper.dimensions_inches();
        if !(0.0..paper_w.min(paper_h) / 2.0).contains(&c.layout.margin_inches) {
            return Err(ExportError::InvalidConfig(format!(
                "margin must be ≥ 0 and leave printable area, got {}in",
                c.layout.margin_inches
            )));
        }
        if c.navigation_timeout_secs == 0 {
            return Err(ExportError::InvalidConfig(
                "navigation timeout must be ≥ 1s".into(),
            ));
        }
        if c.viewport.width == 0 || c.viewport.height == 0 {
            return Err(ExportError::InvalidConfig(format!(
                "viewport must be non-empty, got {}x{}",
                c.viewport.width, c.viewport.height
            )));
        }
        let dsf = c.viewport.device_scale_factor;
        if !(dsf.is_finite() && dsf > 0.0 && dsf <= 4.0) {
            return Err(ExportError::InvalidConfig(format!(
                "device scale factor must be in (0, 4], got {dsf}"
            )));
        }
        if c.placeholder.initials.chars().count() != 2 {
            return Err(ExportError::InvalidConfig(format!(
                "placeholder initials must be two characters, got {:?}",
                c.placeholder.initials
            )));
        }
        Ok(self.config)
    }
}

// ── Plain-data settings ──────────────────────────────────────────────────

/// Browser window size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Applied to the page through device-metrics emulation.
    pub device_scale_factor: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            device_scale_factor: 1.0,
        }
    }
}

/// Paper formats supported by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    /// Width and height in inches, portrait.
    pub fn dimensions_inches(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (8.27, 11.69),
            PaperSize::Letter => (8.5, 11.0),
        }
    }
}

/// Page geometry of the exported PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfLayout {
    pub paper: PaperSize,
    /// Uniform margin in inches. Default: 0.4.
    pub margin_inches: f64,
    /// Content scale. Default: 0.75, which keeps the two-column layout on
    /// two pages.
    pub scale: f64,
    pub print_background: bool,
    pub display_header_footer: bool,
    pub prefer_css_page_size: bool,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            margin_inches: 0.4,
            scale: 0.75,
            print_background: true,
            display_header_footer: false,
            prefer_css_page_size: false,
        }
    }
}

/// Look of the generated stand-in for a broken profile picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderStyle {
    /// Two-letter initials drawn in the centre.
    pub initials: String,
    /// Edge length in pixels (the image is square).
    pub size: u32,
    pub background: String,
    pub foreground: String,
    pub font_family: String,
    pub font_size_px: u32,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        Self {
            initials: "KG".to_string(),
            size: 100,
            background: "#ffffff".to_string(),
            foreground: "#6d6e8a".to_string(),
            font_family: "Arial".to_string(),
            font_size_px: 40,
        }
    }
}

/// How the headless browser is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Explicit browser executable. `None` lets headless_chrome auto-detect.
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    /// Chromium's sandbox needs user namespaces, which CI containers lack.
    pub sandbox: bool,
    /// Extra command-line switches.
    pub args: Vec<String>,
    /// Kill the browser if it sees no DevTools traffic for this long.
    pub idle_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            sandbox: false,
            args: [
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-extensions",
                "--no-first-run",
                "--disable-default-apps",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            idle_timeout_secs: 120,
        }
    }
}

impl BrowserSettings {
    pub fn args_os(&self) -> Vec<OsString> {
        self.args.iter().map(OsString::from).collect()
    }
}
