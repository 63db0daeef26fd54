//! Quote-aware bracket counting and parameter splitting.
//!
//! Both routines share one lexical model: `"` toggles a quoted run, a backslash
//! consumes the next character, and delimiters inside quotes are inert.

/// Signed paren/bracket depth change across a fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Depth {
    pub paren: i32,
    pub bracket: i32,
}

impl Depth {
    pub fn add(&mut self, other: Depth) {
        self.paren += other.paren;
        self.bracket += other.bracket;
    }

    /// True once neither depth is positive. Over-closed counts are treated as balanced.
    pub fn is_balanced(&self) -> bool {
        self.paren <= 0 && self.bracket <= 0
    }
}

/// Count unbalanced `()` and `[]` in `text`, ignoring those inside quotes.
///
/// Never fails: an unterminated quote leaves everything after it uncounted.
pub fn count_delimiters(text: &str) -> Depth {
    let mut depth = Depth::default();
    let mut in_quote = false;
    let mut escape = false;

    for ch in text.chars() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' => escape = true,
            '"' => in_quote = !in_quote,
            _ if in_quote => {}
            '(' => depth.paren += 1,
            ')' => depth.paren -= 1,
            '[' => depth.bracket += 1,
            ']' => depth.bracket -= 1,
            _ => {}
        }
    }

    depth
}

/// Split a parameter list on top-level semicolons.
///
/// Semicolons inside quotes or nested `()`/`[]` stay in their segment, and escaped
/// characters are kept verbatim (backslash included). Segments are returned untrimmed.
pub fn split_params(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = Depth::default();
    let mut in_quote = false;
    let mut escape = false;

    for ch in s.chars() {
        if escape {
            current.push(ch);
            escape = false;
            continue;
        }
        match ch {
            '\\' => escape = true,
            '"' => in_quote = !in_quote,
            _ if in_quote => {}
            '(' => depth.paren += 1,
            ')' => depth.paren -= 1,
            '[' => depth.bracket += 1,
            ']' => depth.bracket -= 1,
            ';' if depth.paren == 0 && depth.bracket == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_open_delimiters() {
        assert_eq!(count_delimiters("Set Variable [ $x ; Value: (1+"), Depth { paren: 1, bracket: 1 });
        assert_eq!(count_delimiters("2) ]"), Depth { paren: -1, bracket: -1 });
    }

    #[test]
    fn ignores_delimiters_in_quotes() {
        assert_eq!(count_delimiters(r#"If [ x = "(]" ]"#), Depth::default());
    }

    #[test]
    fn escaped_quote_does_not_toggle() {
        assert_eq!(count_delimiters(r#""a\"(" )"#), Depth { paren: -1, bracket: 0 });
    }

    #[test]
    fn unterminated_quote_swallows_rest() {
        assert_eq!(count_delimiters(r#"If [ "abc ( ["#), Depth { paren: 0, bracket: 1 });
    }

    #[test]
    fn depth_balance() {
        assert!(Depth { paren: -1, bracket: 0 }.is_balanced());
        assert!(!Depth { paren: 0, bracket: 1 }.is_balanced());
    }

    #[test]
    fn splits_on_top_level_semicolons_only() {
        let parts = split_params(r#""T" ; Let ( [ a = 1 ; b = 2 ] ; a + b ) ; "x;y""#);
        assert_eq!(
            parts,
            vec![
                r#""T" "#.to_string(),
                r#" Let ( [ a = 1 ; b = 2 ] ; a + b ) "#.to_string(),
                r#" "x;y""#.to_string(),
            ]
        );
    }

    #[test]
    fn split_keeps_escapes() {
        let parts = split_params(r#""a\";b" ; c"#);
        assert_eq!(parts, vec![r#""a\";b" "#.to_string(), " c".to_string()]);
    }

    #[test]
    fn empty_input_has_no_segments() {
        assert!(split_params("").is_empty());
    }
}
