//! AppleScript string-literal escaping.
//!
//! Caller-supplied values enter AppleScript source only through [`quoted`]
//! (or [`ScriptBuilder::literal`]), which escapes backslashes and double
//! quotes so the value cannot terminate the enclosing literal or introduce
//! statements. Structural fragments — `tell` targets, property names,
//! repeat loops — are fixed strings owned by the command handlers.
//!
//! Limitation: escaping protects literal positions only. An application or
//! object name interpolated into a structural position (`tell application
//! "<name>"`) is escaped like any literal, but it still chooses which app
//! the script drives; there is no syntactic defense against a hostile app
//! name beyond that. Values bound for external tools bypass this entirely
//! and travel as discrete argv elements.

/// Escape a value for embedding between AppleScript double quotes:
/// `\` becomes `\\`, `"` becomes `\"`.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}

/// An AppleScript string literal holding `value`, quotes included.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

/// Incremental script assembly that keeps the trusted/untrusted boundary
/// visible at the call site: [`raw`] takes structural fragments the command
/// handler owns, [`literal`] takes caller data and sanitizes it.
///
/// [`raw`]: ScriptBuilder::raw
/// [`literal`]: ScriptBuilder::literal
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    buf: String,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trusted structural fragment verbatim.
    pub fn raw(mut self, fragment: &str) -> Self {
        self.buf.push_str(fragment);
        self
    }

    /// Append caller data as an escaped, double-quoted literal.
    pub fn literal(mut self, value: &str) -> Self {
        self.buf.push_str(&quoted(value));
        self
    }

    pub fn build(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape(r#"He said "hi"\now"#), r#"He said \"hi\"\\now"#);
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(escape("hello, world"), "hello, world");
    }

    #[test]
    fn backslash_is_escaped_before_it_can_eat_a_quote() {
        // A trailing backslash must not turn the closing quote into \".
        assert_eq!(quoted("end\\"), r#""end\\""#);
    }

    #[test]
    fn keystroke_template_stays_a_single_literal() {
        let value = r#"say "hi""#;
        let script = format!("keystroke {}", quoted(value));
        assert_eq!(script, r#"keystroke "say \"hi\"""#);
    }

    #[test]
    fn quoted_value_cannot_close_the_literal() {
        let hostile = r#"" & (do shell script "true") & ""#;
        let q = quoted(hostile);
        // Every interior quote must come out escaped; only the delimiters
        // remain bare.
        let interior = &q[1..q.len() - 1];
        let mut prev_backslash = false;
        for ch in interior.chars() {
            if ch == '"' {
                assert!(prev_backslash, "unescaped quote inside literal: {q}");
            }
            prev_backslash = ch == '\\' && !prev_backslash;
        }
    }

    #[test]
    fn builder_separates_structure_from_data() {
        let script = ScriptBuilder::new()
            .raw("tell application \"Contacts\"\n  set entry to first person whose name is ")
            .literal("Ada \"The Countess\" Lovelace")
            .raw("\n  return value of first phone of entry\nend tell")
            .build();
        assert!(script.contains(r#"name is "Ada \"The Countess\" Lovelace""#));
        assert!(script.starts_with("tell application \"Contacts\""));
        assert!(script.ends_with("end tell"));
    }

    #[test]
    fn escaping_round_trips_through_a_literal_parse() {
        // Unescape what quoted() produced and expect the original back.
        let original = r#"path\to "file" with \" mixed"#;
        let q = quoted(original);
        let interior = &q[1..q.len() - 1];
        let mut unescaped = String::new();
        let mut chars = interior.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                unescaped.push(chars.next().unwrap());
            } else {
                unescaped.push(ch);
            }
        }
        assert_eq!(unescaped, original);
    }
}
