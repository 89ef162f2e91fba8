//! What the controller needs from its host, as traits.
//!
//! Every capability may be missing at runtime (private browsing without
//! storage, engines without `matchMedia`, a page without the accent meta
//! tag). Each method reports absence through its return value; none of them
//! fail.

use crate::mode::Mode;

/// Persistent key-value storage holding the preference under
/// [`crate::STORAGE_KEY`].
pub trait PreferenceStore {
    /// Raw stored value, `None` when nothing is stored or storage is absent.
    fn load(&self) -> Option<String>;

    /// Store `value`. Returns `false` when storage is absent or refused.
    fn save(&self, value: &str) -> bool;
}

/// How a platform lets callers observe colour-scheme changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerSupport {
    /// `addEventListener("change", ..)` on the media query.
    Modern,
    /// The older `addListener(..)` registration.
    Legacy,
    /// Neither exists; changes are not observed.
    Unavailable,
}

impl ListenerSupport {
    pub fn is_available(self) -> bool {
        !matches!(self, ListenerSupport::Unavailable)
    }
}

/// Callback receiving the new "prefers dark" value.
pub type SchemeListener = Box<dyn Fn(bool)>;

/// The platform's colour-scheme preference.
pub trait SystemScheme {
    /// `Some(true)` when the platform prefers dark, `None` when it cannot say.
    fn prefers_dark(&self) -> Option<bool>;

    /// Register `listener` for preference changes using whichever
    /// registration the platform offers.
    fn subscribe(&self, listener: SchemeListener) -> ListenerSupport;
}

/// The rendered document.
pub trait ThemeHost {
    /// Current value of [`crate::THEME_ATTRIBUTE`] on the root element.
    fn mode_attribute(&self) -> Option<String>;

    fn set_mode_attribute(&self, value: &str);

    /// Set the accent hint. Returns `false` when the page has no hint element.
    fn set_accent_hint(&self, color: &str) -> bool;

    /// Emit [`crate::THEME_CHANGED_EVENT`] for `mode`.
    fn notify_changed(&self, mode: Mode);
}
