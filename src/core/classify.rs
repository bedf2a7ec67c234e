// Lovi - core/classify.rs
//
// Line classification by case-insensitive marker substrings, and markup
// rendering of classified lines.
// Core layer: pure logic, no I/O or UI dependencies.

use crate::core::model::{LineClass, RenderedLine};
use crate::util::constants::{
    DEFAULT_ERROR_MARKERS, DEFAULT_WARNING_MARKERS, ERROR_MARKUP_COLOUR, WARNING_MARKUP_COLOUR,
};
use std::borrow::Cow;

/// Immutable snapshot of the error and warning markers.
///
/// Markers are stored lower-cased, trimmed, and de-duplicated in their
/// original order. Empty markers are dropped because an empty substring
/// would match every line. Sessions share one snapshot behind an `Arc` and
/// a settings change replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterMarkers {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl FilterMarkers {
    pub fn new<E, W>(errors: E, warnings: W) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        Self {
            errors: normalise(errors),
            warnings: normalise(warnings),
        }
    }

    /// Parse comma-separated marker lists as typed into the filters window.
    pub fn from_csv(errors: &str, warnings: &str) -> Self {
        Self::new(errors.split(','), warnings.split(','))
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Default for FilterMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_MARKERS, DEFAULT_WARNING_MARKERS)
    }
}

fn normalise<I>(markers: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for marker in markers {
        let m = marker.as_ref().trim().to_lowercase();
        if !m.is_empty() && !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

/// Classify a line. Error markers take precedence over warning markers.
pub fn classify(line: &str, markers: &FilterMarkers) -> LineClass {
    let lower = line.to_lowercase();
    if markers.errors.iter().any(|m| lower.contains(m.as_str())) {
        LineClass::Error
    } else if markers.warnings.iter().any(|m| lower.contains(m.as_str())) {
        LineClass::Warning
    } else {
        LineClass::Normal
    }
}

/// Escape the characters that carry meaning in the view markup.
pub fn escape_markup(line: &str) -> Cow<'_, str> {
    if !line.contains(['&', '<', '>']) {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len() + 16);
    for c in line.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Render a classified line: escaped, then wrapped in a colour marker for
/// errors and warnings. Normal lines are escaped only.
pub fn render(line: &str, class: LineClass) -> String {
    let escaped = escape_markup(line);
    match class {
        LineClass::Error => format!("<font color=\"{ERROR_MARKUP_COLOUR}\">{escaped}</font>"),
        LineClass::Warning => {
            format!("<font color=\"{WARNING_MARKUP_COLOUR}\">{escaped}</font>")
        }
        LineClass::Normal => escaped.into_owned(),
    }
}

/// Classify and render in one step.
pub fn render_line(text: String, markers: &FilterMarkers) -> RenderedLine {
    let class = classify(&text, markers);
    let markup = render(&text, class);
    RenderedLine {
        text,
        class,
        markup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_markers() {
        let m = FilterMarkers::default();
        assert_eq!(m.errors(), ["error", "fail", "badness"]);
        assert_eq!(m.warnings(), ["warning", "cannot", "can't", "unable"]);
    }

    #[test]
    fn test_error_takes_precedence_over_warning() {
        let m = FilterMarkers::default();
        assert_eq!(
            classify("warning: cannot flush, write failed", &m),
            LineClass::Error
        );
    }

    #[test]
    fn test_case_insensitive() {
        let m = FilterMarkers::default();
        assert_eq!(classify("disk ERROR on sda", &m), LineClass::Error);
        assert_eq!(classify("disk error on sda", &m), LineClass::Error);
        assert_eq!(classify("Unable to resolve host", &m), LineClass::Warning);
        assert_eq!(classify("all good", &m), LineClass::Normal);
    }

    #[test]
    fn test_markers_are_normalised() {
        let m = FilterMarkers::from_csv(" Panic , ,panic,OOPS", "");
        assert_eq!(m.errors(), ["panic", "oops"]);
        assert!(m.warnings().is_empty());
        assert_eq!(classify("kernel PANIC", &m), LineClass::Error);
        assert_eq!(classify("", &m), LineClass::Normal);
    }

    #[test]
    fn test_escaping_applies_to_every_class() {
        assert_eq!(render("<script>", LineClass::Normal), "&lt;script&gt;");
        assert_eq!(
            render("<b>error</b>", LineClass::Error),
            "<font color=\"red\">&lt;b&gt;error&lt;/b&gt;</font>"
        );
        assert_eq!(
            render("a & b > c", LineClass::Warning),
            "<font color=\"blue\">a &amp; b &gt; c</font>"
        );
    }

    #[test]
    fn test_render_line_keeps_raw_text() {
        let line = render_line("an error <here>".to_string(), &FilterMarkers::default());
        assert_eq!(line.text, "an error <here>");
        assert_eq!(line.class, LineClass::Error);
        assert!(line.markup.contains("&lt;here&gt;"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            .. ProptestConfig::default()
        })]

        #[test]
        fn classification_ignores_case(line in "[a-zA-Z ']{0,40}") {
            let m = FilterMarkers::default();
            prop_assert_eq!(classify(&line, &m), classify(&line.to_uppercase(), &m));
        }

        #[test]
        fn any_line_with_an_error_marker_is_an_error(
            prefix in "[a-z ]{0,20}",
            suffix in "[a-z ]{0,20}",
            idx in 0usize..3,
        ) {
            let m = FilterMarkers::default();
            let line = format!("{prefix}{} unable {suffix}", m.errors()[idx]);
            prop_assert_eq!(classify(&line, &m), LineClass::Error);
        }

        #[test]
        fn rendered_markup_never_contains_raw_angle_brackets_from_input(
            line in "[ -~]{0,60}",
            class_idx in 0usize..3,
        ) {
            let class = [LineClass::Normal, LineClass::Warning, LineClass::Error][class_idx];
            let out = render(&line, class);
            let inner = out
                .trim_start_matches("<font color=\"red\">")
                .trim_start_matches("<font color=\"blue\">")
                .trim_end_matches("</font>");
            prop_assert!(!inner.contains('<') && !inner.contains('>'));
        }
    }
}
