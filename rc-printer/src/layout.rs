//! Text layout helpers
//!
//! Widths are counted in characters. The printer runs a single-byte code
//! page, so one character occupies one column.

use std::str::SplitWhitespace;

/// Character width of a string
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Greedy word wrap
///
/// Returns a lazy iterator over the wrapped lines. Words are packed onto a
/// line while `line + ' ' + word` still fits `width`. A word longer than
/// `width` is emitted alone on its own line, unsplit. Runs of whitespace
/// collapse to a single space and are never carried across a break.
///
/// The iterator is `Clone`, so a wrap can be replayed from any point.
pub fn wrap(text: &str, width: usize) -> Wrap<'_> {
    Wrap {
        words: text.split_whitespace(),
        pending: None,
        width,
    }
}

/// Iterator returned by [`wrap`]
#[derive(Debug, Clone)]
pub struct Wrap<'a> {
    words: SplitWhitespace<'a>,
    pending: Option<&'a str>,
    width: usize,
}

impl Iterator for Wrap<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.pending.take().or_else(|| self.words.next())?;

        let mut line = String::from(first);
        let mut len = text_width(first);

        for word in self.words.by_ref() {
            let word_len = text_width(word);
            if len + 1 + word_len <= self.width {
                line.push(' ');
                line.push_str(word);
                len += 1 + word_len;
            } else {
                self.pending = Some(word);
                break;
            }
        }

        Some(line)
    }
}

/// Pad lines on the right to a common width
///
/// Under center alignment each line is centered on its own, so lines of
/// different length drift apart. Padding them to the longest line makes the
/// printer center the block as a whole and keeps the left edges aligned.
pub fn center_block<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let max = lines
        .iter()
        .map(|l| text_width(l.as_ref()))
        .max()
        .unwrap_or(0);

    lines.iter().map(|l| pad(l.as_ref(), max, false)).collect()
}

/// Truncate a string to at most `max` characters (hard cut, no ellipsis)
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Pad a string to `width` characters
///
/// Strings already at or beyond `width` are returned unchanged.
pub fn pad(s: &str, width: usize, align_right: bool) -> String {
    let current = text_width(s);
    if current >= width {
        return s.to_string();
    }
    let spaces = " ".repeat(width - current);
    if align_right {
        format!("{}{}", spaces, s)
    } else {
        format!("{}{}", s, spaces)
    }
}

/// Left column truncated and padded to `width`, for fixed-width tables
pub fn fixed_column(s: &str, width: usize) -> String {
    pad(&truncate(s, width), width, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str, width: usize) -> Vec<String> {
        wrap(text, width).collect()
    }

    #[test]
    fn test_wrap_packs_greedily() {
        assert_eq!(
            lines("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_wrap_exact_fit() {
        // "ab cd" is exactly 5
        assert_eq!(lines("ab cd ef", 5), vec!["ab cd", "ef"]);
    }

    #[test]
    fn test_wrap_long_word_alone() {
        assert_eq!(
            lines("a verylongwordhere b", 5),
            vec!["a", "verylongwordhere", "b"]
        );
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        assert_eq!(lines("  one   two \n three  ", 42), vec!["one two three"]);
        assert!(lines("   ", 10).is_empty());
        assert!(lines("", 10).is_empty());
    }

    #[test]
    fn test_wrap_width_invariant() {
        let text = "Laptop start niet meer op na een update, scherm blijft zwart \
                    en de ventilator maakt een ratelend geluid bij het opstarten";
        for width in 1..60 {
            for line in wrap(text, width) {
                let fits = text_width(&line) <= width;
                let lone_word = !line.contains(' ');
                assert!(fits || lone_word, "width {width}: {line:?}");
            }
        }
    }

    #[test]
    fn test_wrap_is_restartable() {
        let mut it = wrap("one two three four", 7);
        assert_eq!(it.next().as_deref(), Some("one two"));
        let replay = it.clone();
        assert_eq!(it.collect::<Vec<_>>(), replay.collect::<Vec<_>>());
        assert_eq!(lines("one two three four", 7), lines("one two three four", 7));
    }

    #[test]
    fn test_wrap_counts_characters() {
        assert_eq!(lines("één twee", 8), vec!["één twee"]);
    }

    #[test]
    fn test_center_block() {
        let block = center_block(&["ab", "abcd", "a"]);
        assert_eq!(block, vec!["ab  ", "abcd", "a   "]);
        assert!(center_block::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_truncate_and_pad() {
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hi", 5), "hi");
        assert_eq!(pad("hi", 5, false), "hi   ");
        assert_eq!(pad("hi", 5, true), "   hi");
        assert_eq!(pad("hello world", 5, false), "hello world");
        assert_eq!(fixed_column("Schroevendraaier set groot", 25), "Schroevendraaier set groo");
        assert_eq!(fixed_column("Screw", 8), "Screw   ");
    }
}
