use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

// Source roots that must obey the hygiene rules. The read-only example pack
// and build output are never scanned.
const SOURCE_ROOTS: [&str; 4] = ["analyze", "cli", "tests", "benches"];

const FORBIDDEN_WORDS: [&str; 14] = [
    "FIXED",
    "CORRECTED",
    "FIX",
    "FIXES",
    "NEW",
    "CHANGED",
    "CHANGES",
    "CHANGE",
    "MODIFIED",
    "MODIFIES",
    "MODIFY",
    "UPDATED",
    "UPDATES",
    "UPDATE",
];

/// One source rule: a line regex plus a filter that decides whether a
/// matched line really is a violation.
struct Rule {
    name: &'static str,
    pattern: String,
    is_violation: fn(&str) -> bool,
    advice: &'static str,
}

// Collects every offending line of a single file for one rule.
struct RuleCollector<'r> {
    rule: &'r Rule,
    file_path: PathBuf,
    violations: Vec<String>,
}

impl<'r> RuleCollector<'r> {
    fn new(rule: &'r Rule, file_path: &Path) -> Self {
        Self {
            rule,
            file_path: file_path.to_path_buf(),
            violations: Vec::new(),
        }
    }

    fn error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }
        let mut msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            self.rule.name,
            self.file_path.display()
        );
        for violation in &self.violations {
            msg.push_str(&format!("   {violation}\n"));
        }
        msg.push_str(&format!("\n⚠️ {}\n", self.rule.advice));
        Some(msg)
    }
}

impl Sink for RuleCollector<'_> {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if (self.rule.is_violation)(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn is_doc_comment(line: &str) -> bool {
    line.trim_start().starts_with("///") || line.trim_start().starts_with("//!")
}

/// The text after the comment marker, if the line is a comment.
fn comment_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("///").or_else(|| trimmed.strip_prefix("//!")) {
        return Some(rest.trim());
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(rest.trim());
    }
    None
}

fn underscore_binding_violation(line: &str) -> bool {
    if comment_text(line).is_some() {
        return false;
    }
    // Matches between double quotes are string contents.
    let in_string = line
        .split('"')
        .enumerate()
        .any(|(i, part)| i % 2 == 1 && part.contains('_'));
    !in_string
}

fn forbidden_word_violation(line: &str) -> bool {
    comment_text(line).is_some_and(|text| {
        text.split(|c: char| !c.is_alphanumeric())
            .any(|word| FORBIDDEN_WORDS.contains(&word))
    })
}

fn double_star_violation(line: &str) -> bool {
    !is_doc_comment(line) && comment_text(line).is_some_and(|text| text.contains("**"))
}

fn all_caps_violation(line: &str) -> bool {
    comment_text(line).is_some_and(|text| {
        let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
        letters.peek().is_some() && letters.all(char::is_uppercase)
    })
}

fn always(_: &str) -> bool {
    true
}

fn rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "underscore-prefixed bindings",
            pattern: r"\b(_[a-zA-Z0-9_]+)\b".to_string(),
            is_violation: underscore_binding_violation,
            advice: "Underscore-prefixed names are not allowed. Use the binding or remove it.",
        },
        Rule {
            name: "forbidden comment words",
            pattern: format!(r"//.*(?:{})", FORBIDDEN_WORDS.join("|")),
            is_violation: forbidden_word_violation,
            advice: "Comments must describe the code, not its edit history.",
        },
        Rule {
            name: "'**' in regular comments",
            pattern: r"//.*\*\*".to_string(),
            is_violation: double_star_violation,
            advice: "The '**' pattern is only allowed in doc comments.",
        },
        Rule {
            name: "all-uppercase comments",
            pattern: r"//.*".to_string(),
            is_violation: all_caps_violation,
            advice: "Comments whose letters are all uppercase are not allowed.",
        },
        Rule {
            name: "#[allow(dead_code)] attributes",
            pattern: r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]".to_string(),
            is_violation: always,
            advice: "Use the code or delete it; dead code may not be silenced.",
        },
    ]
}

fn source_files() -> impl Iterator<Item = PathBuf> {
    SOURCE_ROOTS
        .into_iter()
        .filter(|root| Path::new(root).is_dir())
        .flat_map(|root| WalkDir::new(root).into_iter().filter_map(|e| e.ok()))
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
}

fn scan_sources() -> Result<(), Box<dyn Error>> {
    let rules = rules();
    let mut searcher = Searcher::new();
    for rule in &rules {
        let matcher = RegexMatcher::new_line_matcher(&rule.pattern)?;
        for path in source_files() {
            let mut collector = RuleCollector::new(rule, &path);
            searcher.search_path(&matcher, &path, &mut collector)?;
            if let Some(message) = collector.error_message() {
                return Err(message.into());
            }
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for root in SOURCE_ROOTS {
        println!("cargo:rerun-if-changed={root}");
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=DEPRISK_BUILD_TIMESTAMP={timestamp}");

    if let Err(e) = scan_sources() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
