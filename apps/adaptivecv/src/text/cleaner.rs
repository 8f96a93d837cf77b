//! Line-level cleanup applied to scraped pages, PDF pages and generated text.

use unicode_normalization::UnicodeNormalization;

/// Drops every character outside the 7-bit ASCII range.
pub fn remove_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Strips non-ASCII characters, trims each line and drops lines left blank.
pub fn clean_lines<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(remove_non_ascii)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

/// `clean_lines` over the lines of a whole block, newline-joined.
pub fn clean_text_block(text: &str) -> String {
    join_lines(&clean_lines(text.lines()))
}

/// Turns a company or job title into a filesystem-safe identifier:
/// title-cases every word, then keeps only ASCII letters and digits.
///
/// `"open ai, inc."` becomes `"OpenAiInc"`.
pub fn clean_identifier(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut previous_cased = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_cased {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            previous_cased = true;
        } else {
            titled.push(c);
            previous_cased = false;
        }
    }

    titled.retain(|c| c.is_ascii_alphanumeric());
    titled
}

/// NFKC-normalizes `text` (ligatures, non-breaking spaces, full-width
/// forms), then replaces typographic quotes and dashes with ASCII.
pub fn clean_generated_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkc() {
        match c {
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            other => out.push(other),
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_non_ascii() {
        assert_eq!(remove_non_ascii("caf\u{e9} \u{2022} menu"), "caf  menu");
        assert_eq!(remove_non_ascii("plain"), "plain");
    }

    #[test]
    fn test_clean_lines_drops_blank_and_trims() {
        let lines = clean_lines(vec!["  Senior Engineer ", "", "\u{2022}", "  Remote"]);
        assert_eq!(lines, vec!["Senior Engineer", "Remote"]);
    }

    #[test]
    fn test_clean_text_block() {
        let block = "Title\r\n\r\n   Body line   \n\u{a0}\n";
        assert_eq!(clean_text_block(block), "Title\nBody line");
    }

    #[test]
    fn test_clean_identifier() {
        assert_eq!(clean_identifier("open ai, inc."), "OpenAiInc");
        assert_eq!(clean_identifier("Senior Rust engineer"), "SeniorRustEngineer");
        assert_eq!(clean_identifier("3d printing"), "3DPrinting");
        assert_eq!(clean_identifier(""), "");
    }

    #[test]
    fn test_clean_generated_text() {
        let text = "  \u{201C}Hello\u{201D} \u{2014} it\u{2019}s me  ";
        assert_eq!(clean_generated_text(text), "\"Hello\" - it's me");
    }

    #[test]
    fn test_clean_generated_text_applies_nfkc() {
        assert_eq!(clean_generated_text("\u{FB01}le\u{A0}ok"), "file ok");
        assert_eq!(clean_generated_text("\u{FF32}ust \u{2013} \u{2460}"), "Rust - 1");
    }
}
