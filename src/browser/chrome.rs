//! Production driver on top of `headless_chrome`.
//!
//! `headless_chrome` is synchronous and keeps a DevTools websocket per
//! browser. The pipeline therefore runs on tokio's blocking pool (see
//! [`crate::export::export`]).
//!
//! A `headless_chrome` context borrows its browser, which cannot be stored
//! next to it. [`ChromeContext`] keeps a clone of the browser plus the
//! context id instead. The context's single tab is opened together with the
//! context and handed out by the first `new_page` call; an export never needs
//! more than one page.
//!
//! `headless_chrome` keeps browser-level CDP calls private, so
//! `Target.disposeBrowserContext` cannot be sent. Closing a context closes
//! every tab still open in it; the context itself goes with the browser
//! process.

use super::{
    BrowserHandle, BrowserLauncher, ContextHandle, NavigationResponse, PageHandle, PdfOptions,
    Script,
};
use crate::config::{BrowserSettings, Viewport};
use crate::error::ExportError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use std::cell::RefCell;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Launches a local Chromium through `headless_chrome`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeLauncher;

impl BrowserLauncher for ChromeLauncher {
    fn launch(
        &self,
        settings: &BrowserSettings,
        viewport: &Viewport,
    ) -> Result<Box<dyn BrowserHandle>, ExportError> {
        let args = settings.args_os();
        let arg_refs: Vec<&OsStr> = args.iter().map(|a| a.as_os_str()).collect();

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .sandbox(settings.sandbox)
            .window_size(Some((viewport.width, viewport.height)))
            .path(settings.chrome_path.clone())
            .args(arg_refs)
            .idle_browser_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .build()
            .map_err(|e| ExportError::ResourceAcquisition {
                resource: "browser",
                detail: format!("invalid launch options: {e}"),
            })?;

        let browser = Browser::new(options).map_err(|e| ExportError::ResourceAcquisition {
            resource: "browser",
            detail: format!("{e:#}"),
        })?;
        debug!(
            "Chromium launched ({}x{} window, headless={})",
            viewport.width, viewport.height, settings.headless
        );

        Ok(Box::new(ChromeBrowser {
            browser,
            viewport: *viewport,
        }))
    }
}

struct ChromeBrowser {
    browser: Browser,
    viewport: Viewport,
}

/// Page metrics matching `viewport`, including its device scale factor.
fn device_metrics(viewport: &Viewport) -> Emulation::SetDeviceMetricsOverride {
    Emulation::SetDeviceMetricsOverride {
        width: viewport.width,
        height: viewport.height,
        device_scale_factor: viewport.device_scale_factor,
        mobile: false,
        scale: None,
        screen_width: None,
        screen_height: None,
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    }
}

impl BrowserHandle for ChromeBrowser {
    fn new_context(&self) -> Result<Box<dyn ContextHandle>, ExportError> {
        let context = self
            .browser
            .new_context()
            .map_err(|e| ExportError::ResourceAcquisition {
                resource: "browser context",
                detail: format!("{e:#}"),
            })?;
        let id = context.get_id().to_string();
        let tab = context
            .new_tab()
            .map_err(|e| ExportError::ResourceAcquisition {
                resource: "page",
                detail: format!("{e:#}"),
            })?;
        tab.call_method(device_metrics(&self.viewport))
            .map_err(|e| ExportError::ResourceAcquisition {
                resource: "page",
                detail: format!("device metrics: {e:#}"),
            })?;
        debug!("Created browser context {id}");

        Ok(Box::new(ChromeContext {
            browser: self.browser.clone(),
            id,
            tab: Arc::clone(&tab),
            pending: RefCell::new(Some(tab)),
        }))
    }

    fn close(self: Box<Self>) -> Result<(), ExportError> {
        // Dropping the last handle kills the Chromium process.
        drop(self.browser);
        Ok(())
    }
}

struct ChromeContext {
    browser: Browser,
    id: String,
    tab: Arc<Tab>,
    pending: RefCell<Option<Arc<Tab>>>,
}

impl ContextHandle for ChromeContext {
    fn new_page(&self) -> Result<Box<dyn PageHandle>, ExportError> {
        let tab = self
            .pending
            .borrow_mut()
            .take()
            .ok_or_else(|| ExportError::ResourceAcquisition {
                resource: "page",
                detail: format!("context {} already handed out its page", self.id),
            })?;
        Ok(Box::new(ChromePage { tab }))
    }

    fn close(self: Box<Self>) -> Result<(), ExportError> {
        // A tab that was handed out is closed by its page.
        if self.pending.borrow().is_some() {
            self.tab
                .close(false)
                .map_err(|e| ExportError::browser("context close", format!("{e:#}")))?;
        }
        for tab in self.stray_tabs()? {
            debug!("Closing tab {} left in context {}", tab.get_target_id(), self.id);
            tab.close(false)
                .map_err(|e| ExportError::browser("context close", format!("{e:#}")))?;
        }
        debug!("Released browser context {}", self.id);
        Ok(())
    }
}

impl ChromeContext {
    /// Tabs opened in this context by the page itself (popups, `window.open`).
    fn stray_tabs(&self) -> Result<Vec<Arc<Tab>>, ExportError> {
        let candidates: Vec<Arc<Tab>> = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|_| ExportError::browser("context close", "tab list lock poisoned"))?
            .iter()
            .filter(|tab| tab.get_target_id() != self.tab.get_target_id())
            .cloned()
            .collect();

        Ok(candidates
            .into_iter()
            .filter(|tab| match tab.get_browser_context_id() {
                Ok(context) => context.as_deref() == Some(self.id.as_str()),
                // Already gone.
                Err(_) => false,
            })
            .collect())
    }
}

struct ChromePage {
    tab: Arc<Tab>,
}

#[derive(Deserialize)]
struct PageExtent {
    width: f64,
    height: f64,
}

impl ChromePage {
    fn evaluate_expression(&self, expression: &str) -> Result<serde_json::Value, ExportError> {
        let remote = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| ExportError::browser("script", format!("{e:#}")))?;
        match remote.value {
            Some(serde_json::Value::String(json)) => serde_json::from_str(&json)
                .map_err(|e| ExportError::browser("script", format!("bad JSON result: {e}"))),
            Some(other) => Ok(other),
            None => Ok(serde_json::Value::Null),
        }
    }
}

impl PageHandle for ChromePage {
    fn navigate(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<NavigationResponse>, ExportError> {
        let nav_err = |detail: String| ExportError::NavigationFailed {
            url: url.to_string(),
            detail,
        };

        self.tab.set_default_timeout(timeout);
        self.tab
            .navigate_to(url)
            .map_err(|e| nav_err(format!("{e:#}")))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| nav_err(format!("{e:#}")))?;

        let state = self.evaluate_expression(
            "JSON.stringify({ url: location.href, ready_state: document.readyState })",
        )?;
        let response: NavigationResponse = match serde_json::from_value(state) {
            Ok(r) => r,
            Err(_) => return Ok(None),
        };
        if response.url == "about:blank" {
            return Ok(None);
        }
        Ok(Some(response))
    }

    fn evaluate(&self, script: &Script) -> Result<serde_json::Value, ExportError> {
        self.evaluate_expression(&script.expression())
    }

    fn screenshot_full_page(&self) -> Result<Vec<u8>, ExportError> {
        let extent: PageExtent = serde_json::from_value(self.evaluate_expression(
            "JSON.stringify({ width: document.documentElement.scrollWidth, \
             height: document.documentElement.scrollHeight })",
        )?)
        .map_err(|e| ExportError::browser("screenshot", format!("page extent: {e}")))?;

        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width,
            height: extent.height,
            scale: 1.0,
        };
        // `Tab::capture_screenshot` leaves `captureBeyondViewport` unset,
        // which crops everything below the window.
        let shot = self
            .tab
            .call_method(Page::CaptureScreenshot {
                format: Some(Page::CaptureScreenshotFormatOption::Png),
                quality: None,
                clip: Some(clip),
                from_surface: Some(true),
                capture_beyond_viewport: Some(true),
                optimize_for_speed: None,
            })
            .map_err(|e| ExportError::browser("screenshot", format!("{e:#}")))?;
        STANDARD
            .decode(shot.data)
            .map_err(|e| ExportError::browser("screenshot", format!("image data: {e}")))
    }

    fn print_to_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>, ExportError> {
        let options = PrintToPdfOptions {
            landscape: Some(options.landscape),
            display_header_footer: Some(options.display_header_footer),
            print_background: Some(options.print_background),
            scale: Some(options.scale),
            paper_width: Some(options.paper_width),
            paper_height: Some(options.paper_height),
            margin_top: Some(options.margin_top),
            margin_bottom: Some(options.margin_bottom),
            margin_left: Some(options.margin_left),
            margin_right: Some(options.margin_right),
            prefer_css_page_size: Some(options.prefer_css_page_size),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| ExportError::browser("print", format!("{e:#}")))
    }

    fn close(self: Box<Self>) -> Result<(), ExportError> {
        self.tab
            .close(false)
            .map(|_| ())
            .map_err(|e| ExportError::browser("page close", format!("{e:#}")))
    }
}
