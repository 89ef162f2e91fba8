//! Scripted browser driver for pipeline tests.
//!
//! `FakeLauncher` hands out a browser → context → page chain whose every
//! call is appended to a shared event log. Page scripts are answered by
//! [`ScriptKind`] from a [`Scenario`], so each test states only what differs
//! from a healthy résumé page.

#![allow(dead_code)]

use cv_export::browser::{
    BrowserHandle, BrowserLauncher, ContextHandle, NavigationResponse, PageHandle, PdfOptions,
    Script, ScriptKind,
};
use cv_export::{BrowserSettings, ExportError, ExportProgressCallback, Stage, Viewport};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Event log ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Launched,
    ContextCreated,
    PageOpened,
    Navigated(String),
    Evaluated(ScriptKind, String),
    Screenshot,
    Printed(PdfOptions),
    Closed(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Event>>>);

impl Recorder {
    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Resources closed, in order.
    pub fn closes(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Closed(what) => Some(what),
                _ => None,
            })
            .collect()
    }

    pub fn launched(&self) -> bool {
        self.events().contains(&Event::Launched)
    }

    pub fn evaluated(&self, kind: ScriptKind) -> Option<String> {
        self.events().into_iter().find_map(|e| match e {
            Event::Evaluated(k, source) if k == kind => Some(source),
            _ => None,
        })
    }

    pub fn printed(&self) -> Option<PdfOptions> {
        self.events().into_iter().find_map(|e| match e {
            Event::Printed(opts) => Some(opts),
            _ => None,
        })
    }

    pub fn screenshots(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Screenshot))
            .count()
    }
}

// ── Scenario ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Navigation {
    Ok,
    NoResponse,
    Error(String),
}

/// How the fake browser behaves.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub fail_launch: bool,
    pub fail_context: bool,
    pub fail_page: bool,
    pub navigation: Navigation,
    pub responses: HashMap<ScriptKind, Value>,
    pub failing_scripts: Vec<ScriptKind>,
    pub fail_screenshots: bool,
    pub fail_print: bool,
    pub pdf_len: usize,
    pub fail_close: Vec<&'static str>,
}

impl Default for Scenario {
    fn default() -> Self {
        let responses = HashMap::from([
            (
                ScriptKind::ImageSources,
                json!({
                    "location": { "protocol": "file:", "host": "", "pathname": "/srv/cv/_site/index.html" },
                    "images": [
                        { "index": 0, "src": "file:///assets/images/profile.png", "raw": "/assets/images/profile.png" },
                        { "index": 1, "src": "https://img.shields.io/badge.svg", "raw": "https://img.shields.io/badge.svg" }
                    ]
                }),
            ),
            (ScriptKind::RewriteImages, json!(1)),
            (
                ScriptKind::AvatarProbe,
                json!({
                    "found": true,
                    "src": "file:///srv/cv/_site/assets/images/profile.png",
                    "complete": true,
                    "natural_width": 240,
                    "natural_height": 240
                }),
            ),
            (ScriptKind::ReplaceAvatar, json!(true)),
            (
                ScriptKind::StyleProbe,
                json!({ "found": true, "display": "grid", "background_color": "rgba(0, 0, 0, 0)" }),
            ),
            (ScriptKind::ListStylesheets, json!([])),
            (ScriptKind::InjectStyles, json!(true)),
            (
                ScriptKind::BodyText,
                json!({ "title": "Kevin Gonzalez | CV", "text": "Kevin Gonzalez\nSoftware Engineer\nExperience" }),
            ),
            (ScriptKind::HtmlExcerpt, json!("<html><head></head><body></body></html>")),
        ]);

        Self {
            fail_launch: false,
            fail_context: false,
            fail_page: false,
            navigation: Navigation::Ok,
            responses,
            failing_scripts: Vec::new(),
            fail_screenshots: false,
            fail_print: false,
            pdf_len: 48_000,
            fail_close: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn respond(mut self, kind: ScriptKind, value: Value) -> Self {
        self.responses.insert(kind, value);
        self
    }

    pub fn fail_script(mut self, kind: ScriptKind) -> Self {
        self.failing_scripts.push(kind);
        self
    }
}

// ── Driver ───────────────────────────────────────────────────────────────

pub struct FakeLauncher {
    scenario: Arc<Scenario>,
    pub recorder: Recorder,
}

impl FakeLauncher {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario: Arc::new(scenario),
            recorder: Recorder::default(),
        }
    }
}

fn refused(resource: &'static str) -> ExportError {
    ExportError::ResourceAcquisition {
        resource,
        detail: "refused by test scenario".into(),
    }
}

fn close(recorder: &Recorder, scenario: &Scenario, what: &'static str) -> Result<(), ExportError> {
    recorder.push(Event::Closed(what));
    if scenario.fail_close.contains(&what) {
        return Err(ExportError::Browser {
            operation: "close",
            detail: format!("{what} already gone"),
        });
    }
    Ok(())
}

impl BrowserLauncher for FakeLauncher {
    fn launch(
        &self,
        _settings: &BrowserSettings,
        _viewport: &Viewport,
    ) -> Result<Box<dyn BrowserHandle>, ExportError> {
        if self.scenario.fail_launch {
            return Err(refused("browser"));
        }
        self.recorder.push(Event::Launched);
        Ok(Box::new(FakeBrowser {
            scenario: Arc::clone(&self.scenario),
            recorder: self.recorder.clone(),
        }))
    }
}

struct FakeBrowser {
    scenario: Arc<Scenario>,
    recorder: Recorder,
}

impl BrowserHandle for FakeBrowser {
    fn new_context(&self) -> Result<Box<dyn ContextHandle>, ExportError> {
        if self.scenario.fail_context {
            return Err(refused("browser context"));
        }
        self.recorder.push(Event::ContextCreated);
        Ok(Box::new(FakeContext {
            scenario: Arc::clone(&self.scenario),
            recorder: self.recorder.clone(),
        }))
    }

    fn close(self: Box<Self>) -> Result<(), ExportError> {
        close(&self.recorder, &self.scenario, "browser")
    }
}

struct FakeContext {
    scenario: Arc<Scenario>,
    recorder: Recorder,
}

impl ContextHandle for FakeContext {
    fn new_page(&self) -> Result<Box<dyn PageHandle>, ExportError> {
        if self.scenario.fail_page {
            return Err(refused("page"));
        }
        self.recorder.push(Event::PageOpened);
        Ok(Box::new(FakePage {
            scenario: Arc::clone(&self.scenario),
            recorder: self.recorder.clone(),
        }))
    }

    fn close(self: Box<Self>) -> Result<(), ExportError> {
        close(&self.recorder, &self.scenario, "context")
    }
}

struct FakePage {
    scenario: Arc<Scenario>,
    recorder: Recorder,
}

impl PageHandle for FakePage {
    fn navigate(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<Option<NavigationResponse>, ExportError> {
        self.recorder.push(Event::Navigated(url.to_string()));
        match &self.scenario.navigation {
            Navigation::Ok => Ok(Some(NavigationResponse {
                url: url.to_string(),
                ready_state: "complete".into(),
            })),
            Navigation::NoResponse => Ok(None),
            Navigation::Error(detail) => Err(ExportError::NavigationFailed {
                url: url.to_string(),
                detail: detail.clone(),
            }),
        }
    }

    fn evaluate(&self, script: &Script) -> Result<Value, ExportError> {
        self.recorder
            .push(Event::Evaluated(script.kind(), script.source().to_string()));
        if self.scenario.failing_scripts.contains(&script.kind()) {
            return Err(ExportError::Browser {
                operation: "script",
                detail: format!("{:?} threw", script.kind()),
            });
        }
        Ok(self
            .scenario
            .responses
            .get(&script.kind())
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn screenshot_full_page(&self) -> Result<Vec<u8>, ExportError> {
        self.recorder.push(Event::Screenshot);
        if self.scenario.fail_screenshots {
            return Err(ExportError::Browser {
                operation: "screenshot",
                detail: "capture failed".into(),
            });
        }
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    fn print_to_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>, ExportError> {
        self.recorder.push(Event::Printed(options.clone()));
        if self.scenario.fail_print {
            return Err(ExportError::Browser {
                operation: "print",
                detail: "Printing failed".into(),
            });
        }
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.resize(self.scenario.pdf_len.max(pdf.len()), b' ');
        pdf.truncate(self.scenario.pdf_len);
        Ok(pdf)
    }

    fn close(self: Box<Self>) -> Result<(), ExportError> {
        close(&self.recorder, &self.scenario, "page")
    }
}

// ── Site fixtures ────────────────────────────────────────────────────────

/// A plausible built résumé page.
pub const SITE_HTML: &str = r##"<!DOCTYPE html>
<html lang="en" data-theme="light">
<head>
  <meta charset="utf-8">
  <meta name="theme-color" content="#6d6e8a">
  <title>Kevin Gonzalez | CV</title>
  <link rel="stylesheet" href="/assets/css/main.css">
</head>
<body>
  <div class="wrapper">
    <aside class="sidebar"><img class="avatar" src="/assets/images/profile.png" alt="Kevin"></aside>
    <main class="main">
      <section class="section"><h2>Experience</h2><p>Software Engineer, 2019 to present.</p></section>
    </main>
  </div>
</body>
</html>
"##;

/// Write `_site/index.html` under `root` and return its path.
pub fn write_site(root: &Path, html: &str) -> PathBuf {
    let site = root.join("_site");
    std::fs::create_dir_all(&site).unwrap();
    let page = site.join("index.html");
    std::fs::write(&page, html).unwrap();
    page
}

// ── Logging ──────────────────────────────────────────────────────────────

/// Route library logs to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Log sink shared between a subscriber and the test reading it.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Run `f` with warnings and above captured into this buffer.
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Progress ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Start(Stage),
    Complete(Stage),
    Warning(Stage, String),
    Failed(Stage),
    Done(u64),
}

#[derive(Default)]
pub struct ProgressLog(pub Mutex<Vec<Progress>>);

impl ProgressLog {
    pub fn entries(&self) -> Vec<Progress> {
        self.0.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<Stage> {
        self.entries()
            .into_iter()
            .filter_map(|p| match p {
                Progress::Start(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl ExportProgressCallback for ProgressLog {
    fn on_stage_start(&self, stage: Stage) {
        self.0.lock().unwrap().push(Progress::Start(stage));
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.0.lock().unwrap().push(Progress::Complete(stage));
    }

    fn on_stage_warning(&self, stage: Stage, message: &str) {
        self.0
            .lock()
            .unwrap()
            .push(Progress::Warning(stage, message.to_string()));
    }

    fn on_stage_failed(&self, stage: Stage, _error: &str) {
        self.0.lock().unwrap().push(Progress::Failed(stage));
    }

    fn on_export_complete(&self, pdf_bytes: u64) {
        self.0.lock().unwrap().push(Progress::Done(pdf_bytes));
    }
}
