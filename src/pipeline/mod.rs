//! Pipeline stages for site-to-PDF export.
//!
//! Each submodule implements one step. The orchestration (ordering,
//! progress events, guaranteed teardown) lives in [`crate::export`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ acquire ──▶ load ──▶ assets ──▶ probe ──▶ styles ──▶ capture ──▶ print ──▶ persist
//! (file)    (chrome)    (nav)    (img src)  (avatar,  (inject)   (debug     (A4)      (write +
//!                                           wrapper)             PNGs)                verify)
//! ```
//!
//! 1. [`input`]: preflight and content sanity check of the built page
//! 2. [`assets`]: rewrite root-relative image sources for `file://`
//! 3. [`probe`]: avatar completeness with placeholder fallback, style
//!    detection diagnostics
//! 4. [`styles`]: print stylesheet injection
//! 5. [`capture`]: debug snapshots; never fatal
//! 6. [`print`]: body check and PDF rendering
//! 7. [`persist`]: write and size-check the document

pub mod assets;
pub mod capture;
pub mod input;
pub mod persist;
pub mod print;
pub mod probe;
pub mod styles;

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of an export run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Preflight,
    ContentCheck,
    Acquire,
    Load,
    AssetRemediation,
    CompletenessProbe,
    StyleProbe,
    StyleInjection,
    DebugCapture,
    BodyCheck,
    Export,
    Persist,
    Teardown,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 13] = [
        Stage::Preflight,
        Stage::ContentCheck,
        Stage::Acquire,
        Stage::Load,
        Stage::AssetRemediation,
        Stage::CompletenessProbe,
        Stage::StyleProbe,
        Stage::StyleInjection,
        Stage::DebugCapture,
        Stage::BodyCheck,
        Stage::Export,
        Stage::Persist,
        Stage::Teardown,
    ];

    /// Whether a failure here aborts the run.
    ///
    /// Style injection and export are not listed among the remediation
    /// steps either, but a failure there leaves nothing worth persisting,
    /// so they gate too.
    pub fn is_gating(self) -> bool {
        !matches!(
            self,
            Stage::AssetRemediation
                | Stage::CompletenessProbe
                | Stage::StyleProbe
                | Stage::DebugCapture
                | Stage::Teardown
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Preflight => "preflight",
            Stage::ContentCheck => "content check",
            Stage::Acquire => "acquire browser",
            Stage::Load => "load page",
            Stage::AssetRemediation => "fix image paths",
            Stage::CompletenessProbe => "profile image",
            Stage::StyleProbe => "style probe",
            Stage::StyleInjection => "inject print styles",
            Stage::DebugCapture => "debug screenshots",
            Stage::BodyCheck => "body check",
            Stage::Export => "render pdf",
            Stage::Persist => "save pdf",
            Stage::Teardown => "cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remediation_stages_never_gate() {
        for stage in [
            Stage::AssetRemediation,
            Stage::CompletenessProbe,
            Stage::StyleProbe,
            Stage::DebugCapture,
        ] {
            assert!(!stage.is_gating(), "{stage} must not gate");
        }
    }

    #[test]
    fn hard_gates() {
        for stage in [
            Stage::Preflight,
            Stage::ContentCheck,
            Stage::Acquire,
            Stage::Load,
            Stage::BodyCheck,
            Stage::Persist,
        ] {
            assert!(stage.is_gating(), "{stage} must gate");
        }
    }

    #[test]
    fn all_is_in_execution_order() {
        assert_eq!(Stage::ALL.first(), Some(&Stage::Preflight));
        assert_eq!(Stage::ALL.last(), Some(&Stage::Teardown));
        let persist = Stage::ALL.iter().position(|s| *s == Stage::Persist);
        let export = Stage::ALL.iter().position(|s| *s == Stage::Export);
        assert!(export < persist);
    }
}
