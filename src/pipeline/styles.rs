//! Print stylesheet injection.

use crate::browser::{js_string, PageHandle, Script, ScriptKind};
use crate::error::ExportError;
use tracing::info;

/// `id` of the injected `<style>` element. Re-injection replaces it.
pub const STYLE_ELEMENT_ID: &str = "cv-export-print-styles";

pub fn inject_script(css: &str) -> Script {
    Script::new(
        ScriptKind::InjectStyles,
        format!(
            "const id = {id};\n\
             const previous = document.getElementById(id);\n\
             if (previous) previous.remove();\n\
             const style = document.createElement('style');\n\
             style.id = id;\n\
             style.textContent = {css};\n\
             document.head.appendChild(style);\n\
             return style.sheet !== null;",
            id = js_string(STYLE_ELEMENT_ID),
            css = js_string(css)
        ),
    )
}

/// Append `css` to the document head.
///
/// Returns whether the browser parsed it into a stylesheet.
pub fn inject(page: &dyn PageHandle, css: &str) -> Result<bool, ExportError> {
    let attached = page.evaluate(&inject_script(css))?.as_bool().unwrap_or(false);
    info!(
        "Injected print stylesheet ({} bytes, attached: {attached})",
        css.len()
    );
    Ok(attached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PRINT_STYLESHEET;

    #[test]
    fn script_embeds_css_as_string_literal() {
        let script = inject_script("body { content: \"x\"; }\n");
        assert_eq!(script.kind(), ScriptKind::InjectStyles);
        assert!(script.source().contains(r#""body { content: \"x\"; }\n""#));
        assert!(script.source().contains(STYLE_ELEMENT_ID));
    }

    #[test]
    fn default_stylesheet_survives_embedding() {
        let script = inject_script(DEFAULT_PRINT_STYLESHEET);
        // Raw newlines in the CSS must not leak into the JS literal.
        let literal_line = script
            .source()
            .lines()
            .find(|l| l.starts_with("style.textContent"))
            .unwrap();
        assert!(literal_line.ends_with("\";"));
    }
}
