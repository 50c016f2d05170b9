//! Tab-stop normalization.

/// Width of a tab stop in columns.
const TAB_WIDTH: usize = 4;

/// Replace every tab with spaces up to the next 4-column tab stop.
///
/// Columns count from 0 and reset on `\n`. Markdown treats indentation
/// structurally, so mixed tab/space input must be normalized before parsing.
#[must_use]
pub fn expand_tabs(input: &str) -> String {
    if !input.contains('\t') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut column = 0usize;
    for ch in input.chars() {
        match ch {
            '\t' => {
                let pad = TAB_WIDTH - column % TAB_WIDTH;
                for _ in 0..pad {
                    out.push(' ');
                }
                column += pad;
            }
            '\n' => {
                out.push('\n');
                column = 0;
            }
            _ => {
                out.push(ch);
                column += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_no_tabs_unchanged() {
        assert_eq!(expand_tabs("plain text\n"), "plain text\n");
    }

    #[test]
    fn test_leading_tab() {
        assert_eq!(expand_tabs("\tx"), "    x");
    }

    #[test]
    fn test_tab_lands_on_stop() {
        // Column 1 -> pad 3, column 2 -> pad 2, column 3 -> pad 1.
        assert_eq!(expand_tabs("a\tb"), "a   b");
        assert_eq!(expand_tabs("ab\tc"), "ab  c");
        assert_eq!(expand_tabs("abc\td"), "abc d");
        // Column 4 is a stop itself -> full width pad.
        assert_eq!(expand_tabs("abcd\te"), "abcd    e");
    }

    #[test]
    fn test_newline_resets_column() {
        assert_eq!(expand_tabs("ab\n\tx"), "ab\n    x");
    }

    #[test]
    fn test_consecutive_tabs() {
        assert_eq!(expand_tabs("\t\tq"), "        q");
        assert_eq!(expand_tabs("x\ty\tz"), "x   y   z");
    }

    #[test]
    fn test_no_tab_survives() {
        let out = expand_tabs("mixed\t \tindent\n\tsecond");
        assert!(!out.contains('\t'));
    }
}
