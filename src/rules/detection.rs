use crate::RuleMask;
use crate::Rule;
use crate::engine::BucketMask;
use regex::Regex;

/// A label followed by a separator run: 5+ periods, 1+ underscores, or 8+
/// whitespace characters. Searched anywhere in the block.
fn separator_run() -> &'static Regex {
    regex!(r"[^\n\r]+?(?:\.{5,}|_+|\s{8,})")
}

/// What gets stripped from a label once `separator_run` matched. Every run
/// of periods goes, so `D.N.I. ______` becomes `DNI`.
fn separator_strip() -> &'static Regex {
    regex!(r"\.+|_+|\s{8,}")
}

/// Trim `:` and spaces from both ends.
fn trim_label(text: &str) -> &str {
    text.trim_matches(|c: char| c == ':' || c == ' ')
}

/// The label a block offers for an answer area: separators stripped when the
/// block has a separator run, then `:`/space trimmed.
fn label_of(text: &str) -> String {
    if separator_run().is_match(text) {
        trim_label(&separator_strip().replace_all(text, "")).to_string()
    } else {
        trim_label(text).to_string()
    }
}

pub fn get() -> Vec<Rule> {
    vec![
        rule! {
            name: "keyword_containment",
            kind: RuleMask::KEYWORD,
            prod: |view| {
                let lower = view.text.to_lowercase();
                view.keywords.iter().filter(|k| lower.contains(&k.to_lowercase())).cloned().collect()
            }
        },
        rule! {
            name: "separator_run",
            kind: RuleMask::SEPARATOR,
            buckets: BucketMask::SEPARATOR,
            prod: |view| {
                if separator_run().is_match(view.text) {
                    vec![label_of(view.text)]
                } else {
                    Vec::new()
                }
            }
        },
        rule! {
            name: "trailing_colon",
            kind: RuleMask::TRAILING_COLON,
            buckets: BucketMask::TRAILING_COLON,
            prod: |view| {
                if view.text.ends_with(':') {
                    vec![trim_label(view.text).to_string()]
                } else {
                    Vec::new()
                }
            }
        },
        rule! {
            name: "adjacent_blank",
            kind: RuleMask::ADJACENT_BLANK,
            prod: |view| {
                match view.next {
                    Some(next) if next.chars().count() < view.blank_len => vec![label_of(view.text)],
                    _ => Vec::new(),
                }
            }
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_of_strips_separators_only_when_present() {
        assert_eq!(label_of("DNI.........."), "DNI");
        assert_eq!(label_of("D.N.I. ________"), "DNI");
        assert_eq!(label_of("D.N.I.:"), "D.N.I.");
        assert_eq!(label_of("  Nombre: "), "Nombre");
    }
}
