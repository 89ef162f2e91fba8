//! # cv-theme
//!
//! Light/dark mode for the résumé site.
//!
//! The initial mode is the stored preference if there is one, else the
//! platform's colour-scheme preference, else light. The active mode is
//! written to the `data-theme` attribute on the document root, mirrored into
//! the `theme-color` meta tag, and announced with a `themeChanged` event.
//! Toggling (programmatically or with Ctrl/Cmd+Shift+D) persists the new
//! choice; once a choice is stored, platform changes are ignored.
//!
//! The controller talks to the page only through [`PreferenceStore`],
//! [`SystemScheme`] and [`ThemeHost`], so it runs and is tested natively.
//! The `web` feature provides the browser implementations and the exported
//! JS functions `applyInitialMode`, `installThemeSwitcher`, `toggleTheme`
//! and `currentTheme`.
//!
//! ```
//! use cv_theme::Mode;
//!
//! assert_eq!(Mode::Light.toggled(), Mode::Dark);
//! assert_eq!(Mode::parse("dark"), Some(Mode::Dark));
//! assert_eq!(Mode::parse("Dark"), None);
//! ```

pub mod capability;
pub mod controller;
pub mod mode;

#[cfg(feature = "web")]
pub mod web;

pub use capability::{ListenerSupport, PreferenceStore, SchemeListener, SystemScheme, ThemeHost};
pub use controller::{KeyChord, KeyOutcome, ThemeController};
pub use mode::{
    Mode, UnknownMode, ACCENT_META_SELECTOR, DARK_SCHEME_QUERY, STORAGE_KEY, THEME_ATTRIBUTE,
    THEME_CHANGED_EVENT,
};
