//! Telegram MarkdownV2 helpers.
//!
//! Every literal fragment of a MarkdownV2 message must be escaped; the helpers
//! below escape their input and add the markup around it.

/// Characters with special meaning in MarkdownV2.
const SPECIAL: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes markdown special characters for MarkdownV2 parsing mode.
///
/// # Example
/// ```
/// use salon_booking_bot::utils::markdown::escape_markdown;
///
/// let escaped = escape_markdown("Massage (60 min) - 3000.00!");
/// assert_eq!(escaped, "Massage \\(60 min\\) \\- 3000\\.00\\!");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escaped text wrapped in bold markup.
pub fn bold(text: &str) -> String {
    format!("*{}*", escape_markdown(text))
}

/// Inline code; only backslash and backtick need escaping inside.
pub fn code(text: &str) -> String {
    format!("`{}`", text.replace('\\', "\\\\").replace('`', "\\`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_basic_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("_italic_"), "\\_italic\\_");
        assert_eq!(escape_markdown("`code`"), "\\`code\\`");
    }

    #[test]
    fn test_escape_brackets_and_symbols() {
        assert_eq!(escape_markdown("[link](url)"), "\\[link\\]\\(url\\)");
        assert_eq!(escape_markdown("a-b.c!"), "a\\-b\\.c\\!");
        assert_eq!(escape_markdown("50% off #promo"), "50% off \\#promo");
        assert_eq!(escape_markdown("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_markdown(""), "");
        assert_eq!(escape_markdown("Classic massage 60 min"), "Classic massage 60 min");
        assert_eq!(escape_markdown("Массаж"), "Массаж");
    }

    #[test]
    fn test_wrappers() {
        assert_eq!(bold("10:00"), "*10:00*");
        assert_eq!(bold("07.06"), "*07\\.06*");
        assert_eq!(code("a.b"), "`a.b`");
    }
}
