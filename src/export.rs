//! Export entry points and stage orchestration.
//!
//! The browser session is synchronous, so the whole run executes on tokio's
//! blocking pool via [`tokio::task::spawn_blocking`]; the async [`export`]
//! only awaits the finished result.
//!
//! ## Teardown
//!
//! Browser resources live in a [`Session`] that is released after the
//! stages finish, whether they succeeded or not: page, then context, then
//! browser, each closed at most once. A failing close is logged and the
//! remaining resources are still closed. The error that ended the run (if
//! any) is what the caller receives.

use crate::browser::{BrowserHandle, BrowserLauncher, ChromeLauncher, ContextHandle, PageHandle};
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::output::ExportReport;
use crate::pipeline::input::SitePage;
use crate::pipeline::probe::ProfileImageStatus;
use crate::pipeline::{assets, capture, input, persist, print, probe, styles, Stage};
use crate::progress::{ExportProgressCallback, NoopProgressCallback};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Export the built site to PDF with a local Chromium.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(ExportError)` for every gating failure. Problems in the
/// remediation stages are logged, reported through the progress callback
/// and listed in [`ExportReport::warnings`], but never fail the run.
///
/// # Example
/// ```rust,no_run
/// use cv_export::{export, ExportConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = export(&ExportConfig::default()).await?;
/// println!("{} bytes written to {}", report.pdf_bytes, report.output_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn export(config: &ExportConfig) -> Result<ExportReport, ExportError> {
    export_with(Arc::new(ChromeLauncher), config).await
}

/// Like [`export`], with a caller-supplied browser driver.
pub async fn export_with(
    launcher: Arc<dyn BrowserLauncher>,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || run_pipeline(launcher.as_ref(), &config))
        .await
        .map_err(|e| ExportError::Internal(format!("Export task panicked: {e}")))?
}

/// Synchronous wrapper around [`export`].
///
/// Creates a temporary tokio runtime internally.
pub fn export_sync(config: &ExportConfig) -> Result<ExportReport, ExportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExportError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(export(config))
}

/// Run every stage on the current thread. Blocks for the whole export,
/// including settle delays.
pub fn run_pipeline(
    launcher: &dyn BrowserLauncher,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    let started = Instant::now();
    let callback: Arc<dyn ExportProgressCallback> = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));
    let mut stages = StageRunner::new(callback.as_ref());

    info!("Starting PDF export of {}", config.input_path.display());
    callback.on_export_start(Stage::ALL.len());

    // ── Input ────────────────────────────────────────────────────────────
    let input_path = stages.gate(Stage::Preflight, || input::preflight(&config.input_path))?;
    let site = stages.gate(Stage::ContentCheck, || {
        input::check_content(&input_path, config.min_input_chars)
    })?;

    // ── Browser stages, then unconditional teardown ──────────────────────
    let mut session = Session::default();
    let outcome = run_browser_stages(&mut session, &mut stages, launcher, config, &site);

    stages.start(Stage::Teardown);
    for failure in session.teardown() {
        stages.warn(Stage::Teardown, failure);
    }
    stages.complete(Stage::Teardown);

    let mut report = outcome?;
    report.warnings = stages.warnings;
    report.duration_ms = started.elapsed().as_millis() as u64;

    info!(
        "Export complete: {} ({} bytes, {}ms)",
        report.output_path.display(),
        report.pdf_bytes,
        report.duration_ms
    );
    callback.on_export_complete(report.pdf_bytes);
    Ok(report)
}

fn run_browser_stages(
    session: &mut Session,
    stages: &mut StageRunner<'_>,
    launcher: &dyn BrowserLauncher,
    config: &ExportConfig,
    site: &SitePage,
) -> Result<ExportReport, ExportError> {
    stages.gate(Stage::Acquire, || session.acquire(launcher, config))?;
    let page = session
        .page
        .as_deref()
        .ok_or_else(|| ExportError::Internal("page missing after acquisition".into()))?;

    let url = site.url();
    stages.gate(Stage::Load, || {
        info!("Loading page: {url}");
        match page.navigate(&url, config.navigation_timeout())? {
            Some(response) => {
                debug!(
                    "Navigated to {} (readyState: {})",
                    response.url, response.ready_state
                );
                Ok(())
            }
            None => Err(ExportError::NavigationFailed {
                url: url.clone(),
                detail: "no response received".into(),
            }),
        }
    })?;

    let asset_report = stages
        .best_effort(Stage::AssetRemediation, || {
            assets::remediate(page, &config.asset_prefix)
        })
        .unwrap_or_default();

    let profile_image = stages
        .best_effort(Stage::CompletenessProbe, || {
            sleep(config.image_settle());
            probe::probe_avatar(page, &config.avatar_selector, &config.placeholder)
        })
        .unwrap_or(ProfileImageStatus::Unknown);
    if profile_image == ProfileImageStatus::Placeholder {
        stages.warn(
            Stage::CompletenessProbe,
            "profile image failed to load, replaced with placeholder".into(),
        );
    }

    let style_report = stages.best_effort(Stage::StyleProbe, || {
        probe::probe_styles(page, &config.layout_selector)
    });
    if let Some(report) = style_report.as_ref().filter(|r| !r.applied) {
        stages.warn(
            Stage::StyleProbe,
            format!("site styles not applied; {}", report.describe_stylesheets()),
        );
    }

    stages.gate(Stage::StyleInjection, || {
        styles::inject(page, &config.print_stylesheet).map(|_| ())
    })?;

    stages.start(Stage::DebugCapture);
    let debug_screenshots = if config.capture_debug_screenshots {
        let captured = capture::capture(
            page,
            &config.debug_screenshot_path,
            &config.debug_styled_screenshot_path,
            config.style_settle(),
        );
        for warning in captured.warnings {
            stages.warn(Stage::DebugCapture, warning);
        }
        captured.written
    } else {
        debug!("Debug screenshots disabled");
        sleep(config.style_settle());
        Vec::new()
    };
    stages.complete(Stage::DebugCapture);

    let body = stages.gate(Stage::BodyCheck, || print::check_body(page))?;
    let pdf = stages.gate(Stage::Export, || print::render_pdf(page, &config.layout))?;
    let pdf_bytes = stages.gate(Stage::Persist, || {
        persist::save(&config.output_path, &pdf, config.min_output_bytes)
    })?;

    Ok(ExportReport {
        output_path: config.output_path.clone(),
        pdf_bytes,
        input_chars: site.chars,
        title: body.title,
        body_chars: body.text.chars().count(),
        images_inspected: asset_report.inspected,
        images_rewritten: asset_report.rewritten,
        profile_image,
        styles_detected: style_report.as_ref().map(|r| r.applied),
        stylesheets: style_report.map(|r| r.stylesheets).unwrap_or_default(),
        debug_screenshots,
        warnings: Vec::new(),
        duration_ms: 0,
    })
}

fn sleep(duration: std::time::Duration) {
    if !duration.is_zero() {
        debug!("Waiting {}ms to settle", duration.as_millis());
        std::thread::sleep(duration);
    }
}

// ── Stage bookkeeping ────────────────────────────────────────────────────

/// Fires progress events around each stage and collects warnings.
struct StageRunner<'a> {
    callback: &'a dyn ExportProgressCallback,
    warnings: Vec<String>,
}

impl<'a> StageRunner<'a> {
    fn new(callback: &'a dyn ExportProgressCallback) -> Self {
        Self {
            callback,
            warnings: Vec::new(),
        }
    }

    fn start(&self, stage: Stage) {
        debug!("Stage started: {stage}");
        self.callback.on_stage_start(stage);
    }

    fn complete(&self, stage: Stage) {
        self.callback.on_stage_complete(stage);
    }

    fn warn(&mut self, stage: Stage, message: String) {
        warn!("{stage}: {message}");
        self.callback.on_stage_warning(stage, &message);
        self.warnings.push(format!("{stage}: {message}"));
    }

    /// Run a stage whose failure aborts the export.
    fn gate<T>(
        &mut self,
        stage: Stage,
        f: impl FnOnce() -> Result<T, ExportError>,
    ) -> Result<T, ExportError> {
        self.start(stage);
        match f() {
            Ok(value) => {
                self.complete(stage);
                Ok(value)
            }
            Err(e) => {
                error!("Stage {stage} failed: {e}");
                self.callback.on_stage_failed(stage, &e.to_string());
                Err(e)
            }
        }
    }

    /// Run a remediation stage; a failure becomes a warning.
    fn best_effort<T>(
        &mut self,
        stage: Stage,
        f: impl FnOnce() -> Result<T, ExportError>,
    ) -> Option<T> {
        self.start(stage);
        let value = match f() {
            Ok(value) => Some(value),
            Err(e) => {
                self.warn(stage, e.to_string());
                None
            }
        };
        self.complete(stage);
        value
    }
}

// ── Browser session ──────────────────────────────────────────────────────

/// Browser resources acquired so far.
#[derive(Default)]
struct Session {
    browser: Option<Box<dyn BrowserHandle>>,
    context: Option<Box<dyn ContextHandle>>,
    page: Option<Box<dyn PageHandle>>,
}

impl Session {
    /// Launch, open a context, open a page. Each resource is stored as soon
    /// as it exists so a later failure still releases it.
    fn acquire(
        &mut self,
        launcher: &dyn BrowserLauncher,
        config: &ExportConfig,
    ) -> Result<(), ExportError> {
        info!("Launching browser...");
        let browser = self
            .browser
            .insert(launcher.launch(&config.browser, &config.viewport)?);
        info!("Creating browser context...");
        let context = self.context.insert(browser.new_context()?);
        info!("Opening new page...");
        self.page = Some(context.new_page()?);
        Ok(())
    }

    /// Close page, context, browser. Returns the failures, already logged.
    fn teardown(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        let mut record = |what: &str, result: Result<(), ExportError>| match result {
            Ok(()) => debug!("{what} closed"),
            Err(e) => {
                warn!("Failed to close {what}: {e}");
                failures.push(format!("failed to close {what}: {e}"));
            }
        };

        if let Some(page) = self.page.take() {
            record("page", page.close());
        }
        if let Some(context) = self.context.take() {
            record("browser context", context.close());
        }
        if let Some(browser) = self.browser.take() {
            info!("Closing browser...");
            record("browser", browser.close());
        }
        failures
    }
}
