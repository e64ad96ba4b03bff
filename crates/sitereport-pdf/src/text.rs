//! Text measurement and wrapping for the built-in Helvetica face.
//!
//! The widths are class-based approximations, not real font metrics;
//! they only drive centering and wrap points, where a few points of
//! error are invisible.

/// Approximate advance width of one Helvetica glyph, in em units.
fn char_width(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 0.28,
        'f' | 't' | 'r' | 'I' | ' ' | '(' | ')' | '[' | ']' | '-' => 0.35,
        'm' | 'w' | 'M' | 'W' | '@' => 0.89,
        'A'..='Z' | '0'..='9' => 0.67,
        _ => 0.55,
    }
}

/// Approximate width of `text` at `font_size`, in points.
pub fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(char_width).sum::<f64>() * font_size
}

/// Greedy word wrap to `max_width` points. Paragraph breaks are kept; a
/// single word wider than the limit gets its own line rather than being
/// hyphenated.
pub fn wrap_text(text: &str, font_size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if current.is_empty() || text_width(&candidate, font_size) <= max_width {
                current = candidate;
            } else {
                lines.push(current);
                current = word.to_string();
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_width_grows_with_text() {
        assert!(text_width("wide words", 12.0) > text_width("il.", 12.0));
        assert!(text_width("abc", 24.0) > text_width("abc", 12.0));
    }

    #[test]
    fn test_short_text_stays_on_one_line() {
        let lines = wrap_text("Crack observed", 12.0, 500.0);
        assert_eq!(lines, vec!["Crack observed".to_string()]);
    }

    #[test]
    fn test_long_text_wraps_within_width() {
        let text = "Significant cracking along the north retaining wall near the second expansion joint";
        let lines = wrap_text(text, 12.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 12.0) <= 200.0);
        }
        // No words lost in the wrap.
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_paragraph_breaks_are_preserved() {
        let lines = wrap_text("first\nsecond", 12.0, 500.0);
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_oversized_word_gets_its_own_line() {
        let lines = wrap_text("tiny Pneumonoultramicroscopicsilicovolcanoconiosis tiny", 12.0, 60.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "tiny");
        assert_eq!(lines[2], "tiny");
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        assert_eq!(wrap_text("", 12.0, 100.0), vec![String::new()]);
    }
}
