//! Visual modes and the fixed names the site's CSS and scripts agree on.

use std::fmt;
use std::str::FromStr;

/// Storage key of the persisted preference.
pub const STORAGE_KEY: &str = "cv-theme";

/// Attribute on the document root that stylesheets select on.
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Name of the change notification; its detail is `{ theme: "<mode>" }`.
pub const THEME_CHANGED_EVENT: &str = "themeChanged";

/// Platform query for a dark colour-scheme preference.
pub const DARK_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

/// Selector of the browser-chrome accent hint.
pub const ACCENT_META_SELECTOR: &str = "meta[name=\"theme-color\"]";

/// Light or dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Light,
    Dark,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Light => "light",
            Mode::Dark => "dark",
        }
    }

    /// Exact string form, anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Mode::Light),
            "dark" => Some(Mode::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Light => Mode::Dark,
            Mode::Dark => Mode::Light,
        }
    }

    /// Accent colour published for this mode.
    pub fn accent_color(self) -> &'static str {
        match self {
            Mode::Light => "#6d6e8a",
            Mode::Dark => "#8b8ca8",
        }
    }

    pub fn from_dark(dark: bool) -> Self {
        if dark {
            Mode::Dark
        } else {
            Mode::Light
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for [`Mode::from_str`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown theme mode {:?}", self.0)
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::parse(s).ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_exact() {
        assert_eq!(Mode::parse("light"), Some(Mode::Light));
        assert_eq!(Mode::parse("dark"), Some(Mode::Dark));
        assert_eq!(Mode::parse("Dark"), None);
        assert_eq!(Mode::parse(" dark"), None);
        assert_eq!(Mode::parse(""), None);
        assert!("sepia".parse::<Mode>().is_err());
    }

    #[test]
    fn toggled_twice_is_identity() {
        for mode in [Mode::Light, Mode::Dark] {
            assert_ne!(mode.toggled(), mode);
            assert_eq!(mode.toggled().toggled(), mode);
        }
    }

    #[test]
    fn accent_colours() {
        assert_eq!(Mode::Light.accent_color(), "#6d6e8a");
        assert_eq!(Mode::Dark.accent_color(), "#8b8ca8");
    }

    #[test]
    fn display_round_trips() {
        for mode in [Mode::Light, Mode::Dark] {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
    }
}
