//! Mode resolution, application, persistence and toggling.

use crate::capability::{ListenerSupport, PreferenceStore, SystemScheme, ThemeHost};
use crate::mode::Mode;
use std::rc::Rc;
use tracing::debug;

/// A key press as the keyboard handler sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord<'a> {
    pub key: &'a str,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyChord<'_> {
    /// Ctrl (or Cmd) + Shift + D.
    pub fn is_toggle(&self) -> bool {
        (self.ctrl || self.meta) && self.shift && self.key == "D"
    }
}

/// Result of offering a key press to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The shortcut matched; the caller must suppress default handling.
    Toggled(Mode),
    Ignored,
}

/// Applies and persists the page's visual mode.
///
/// Single-threaded: share it with event listeners through `Rc`.
pub struct ThemeController<S, P, H> {
    store: S,
    scheme: P,
    host: H,
}

impl<S, P, H> ThemeController<S, P, H>
where
    S: PreferenceStore,
    P: SystemScheme,
    H: ThemeHost,
{
    pub fn new(store: S, scheme: P, host: H) -> Self {
        Self {
            store,
            scheme,
            host,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheme(&self) -> &P {
        &self.scheme
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Stored preference, ignoring unrecognised values.
    pub fn stored_mode(&self) -> Option<Mode> {
        self.store.load().and_then(|v| Mode::parse(&v))
    }

    pub fn system_mode(&self) -> Option<Mode> {
        self.scheme.prefers_dark().map(Mode::from_dark)
    }

    /// Stored preference, else platform preference, else light.
    pub fn resolve_initial_mode(&self) -> Mode {
        self.stored_mode()
            .or_else(|| self.system_mode())
            .unwrap_or_default()
    }

    /// Set only the root attribute. For use before first paint, when nothing
    /// is listening for change events yet.
    pub fn apply_initial(&self) -> Mode {
        let mode = self.resolve_initial_mode();
        self.host.set_mode_attribute(mode.as_str());
        mode
    }

    /// Make `mode` visible: root attribute, accent hint, change event.
    pub fn apply_mode(&self, mode: Mode) {
        self.host.set_mode_attribute(mode.as_str());
        if !self.host.set_accent_hint(mode.accent_color()) {
            debug!("No accent hint element, skipping");
        }
        self.host.notify_changed(mode);
    }

    pub fn persist_mode(&self, mode: Mode) {
        if !self.store.save(mode.as_str()) {
            debug!("Theme preference not persisted: storage unavailable");
        }
    }

    /// Mode currently on the document; light when absent or unrecognised.
    pub fn current_mode(&self) -> Mode {
        self.host
            .mode_attribute()
            .and_then(|v| Mode::parse(&v))
            .unwrap_or_default()
    }

    /// Flip, apply and persist. Returns the new mode.
    pub fn toggle(&self) -> Mode {
        let next = self.current_mode().toggled();
        self.apply_mode(next);
        self.persist_mode(next);
        next
    }

    /// Platform preference changed. An explicit stored choice wins.
    pub fn on_system_change(&self, prefers_dark: bool) {
        if self.stored_mode().is_some() {
            return;
        }
        self.apply_mode(Mode::from_dark(prefers_dark));
    }

    pub fn handle_key(&self, chord: &KeyChord<'_>) -> KeyOutcome {
        if chord.is_toggle() {
            KeyOutcome::Toggled(self.toggle())
        } else {
            KeyOutcome::Ignored
        }
    }
}

impl<S, P, H> ThemeController<S, P, H>
where
    S: PreferenceStore + 'static,
    P: SystemScheme + 'static,
    H: ThemeHost + 'static,
{
    /// Apply the resolved mode and follow platform changes from now on.
    ///
    /// The listener holds a weak reference, so dropping the last `Rc` stops
    /// it from acting.
    pub fn init(self: &Rc<Self>) -> ListenerSupport {
        self.apply_mode(self.resolve_initial_mode());

        let weak = Rc::downgrade(self);
        let support = self.scheme.subscribe(Box::new(move |prefers_dark| {
            if let Some(controller) = weak.upgrade() {
                controller.on_system_change(prefers_dark);
            }
        }));
        debug!("System colour-scheme listener: {support:?}");
        support
    }
}
