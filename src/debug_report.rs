use formwright::{Dictionary, DetectionReport, Proposal, ReviewItem, RuleMask};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Short tags for the rules behind a candidate, in rule order.
fn rule_tags(mask: RuleMask) -> String {
    let tags: Vec<&str> = [
        (RuleMask::KEYWORD, "keyword"),
        (RuleMask::SEPARATOR, "separator"),
        (RuleMask::TRAILING_COLON, "colon"),
        (RuleMask::ADJACENT_BLANK, "blank"),
    ]
    .into_iter()
    .filter(|(bit, _)| mask.contains(*bit))
    .map(|(_, tag)| tag)
    .collect();
    tags.join("+")
}

pub fn print_detection(source: &str, report: &DetectionReport, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Detecting: \"{}\"", source), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    for rule in &report.metrics.rules {
        println!(
            "  {} {}  {} {}  {} {}",
            palette.paint(rule.name, ansi::CYAN),
            if rule.hits > 0 {
                palette.paint(format!("✓ {} hits", rule.hits), ansi::GREEN)
            } else {
                palette.dim(format!("✗ {} hits", rule.hits))
            },
            palette.dim("evals:"),
            palette.paint(rule.evaluations.to_string(), ansi::YELLOW),
            palette.dim("skipped:"),
            palette.paint(rule.skipped.to_string(), ansi::YELLOW)
        );
    }

    println!("\n{}", palette.paint("━━━ Candidates ━━━", ansi::GRAY));
    if report.candidates.is_empty() {
        println!("{}", palette.dim("  No candidates"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • No block ends in ':' or a run of dots/underscores");
        println!("  • No keyword from the list appears in the document");
        println!("  • Labels were shorter than 3 or longer than 59 characters");
        println!("\n{}", palette.dim("  Tip: Set FORMWRIGHT_LOG=formwright=debug to see every rule firing"));
    } else {
        for (idx, candidate) in report.candidates.iter().enumerate() {
            let blocks: Vec<String> = candidate.blocks.iter().take(3).map(ToString::to_string).collect();
            let more = candidate.blocks.len().saturating_sub(3);
            println!(
                "  {} {} {} {}",
                palette.paint(format!("[{}]", idx), ansi::GRAY),
                palette.bold(palette.paint(&candidate.name, ansi::GREEN)),
                palette.dim("│"),
                palette.paint(rule_tags(candidate.rules), ansi::BLUE),
            );
            println!(
                "      {} {}{}",
                palette.dim("at:"),
                palette.paint(blocks.join(", "), ansi::YELLOW),
                if more > 0 { palette.dim(format!(" ... +{more} more")) } else { String::new() }
            );
        }
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Blocks: {} ({} in tables)  │  Rejected by length: {}",
        palette.paint(format!("{:?}", report.metrics.total), ansi::GREEN),
        palette.paint(report.metrics.blocks.to_string(), ansi::CYAN),
        palette.dim(report.metrics.table_blocks.to_string()),
        palette.dim(report.metrics.rejected_by_length.to_string()),
    );
    println!();
}

pub fn print_review(items: &[ReviewItem], color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.paint("━━━ Review ━━━", ansi::GRAY));
    if items.is_empty() {
        println!("{}", palette.dim("  Nothing to review"));
    }
    for item in items {
        let verdict = match &item.proposal {
            Proposal::Known { canonical } => palette.dim(format!("known as {canonical}")),
            Proposal::SynonymOf { canonical, score } => {
                palette.paint(format!("synonym of {canonical} ({score:.2})"), ansi::GREEN)
            }
            Proposal::NewField { best: Some(best) } => palette.paint(
                format!("new field (closest {} at {:.2})", best.canonical, best.score),
                ansi::YELLOW,
            ),
            Proposal::NewField { best: None } => palette.paint("new field", ansi::YELLOW),
        };
        println!("  {} {} {}", palette.bold(&item.candidate), palette.dim("→"), verdict);
    }
    println!();
}

pub fn print_dictionary(dictionary: &Dictionary, color: bool) {
    let palette = ansi::Palette::new(color);
    if dictionary.is_empty() {
        println!("{}", palette.dim("  Dictionary is empty"));
        return;
    }
    for (field, synonyms) in dictionary.iter() {
        if synonyms.is_empty() {
            println!("  {}", palette.paint(field, ansi::CYAN));
        } else {
            println!(
                "  {} {} {}",
                palette.paint(field, ansi::CYAN),
                palette.dim("←"),
                palette.paint(synonyms.join(", "), ansi::BLUE)
            );
        }
    }
}
