use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use planmd::section::{SectionWarning, duplicate_sections};
use planmd::{Block, extract, parse, serialize};

/// One `[[expect_warnings]]` entry.
#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    pub contains: String,
    /// 1-based line the duplicate heading sits on.
    #[serde(default)]
    pub line: Option<usize>,
}

/// Frontmatter of a `.test.md` scenario. Every expectation is optional;
/// only the ones present are checked.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected section titles, in order.
    #[serde(default)]
    pub expect_sections: Option<Vec<String>>,

    /// Expected block kinds, in order (`heading`, `paragraph`, `bullet_list`, ...).
    #[serde(default)]
    pub expect_blocks: Option<Vec<String>>,

    /// Expected normalized Markdown (trimmed comparison).
    #[serde(default)]
    pub expect_normalized: Option<String>,

    /// If true, parsing the normalized Markdown must give back the same blocks.
    #[serde(default)]
    pub expect_roundtrip: bool,

    /// Expected section warnings. If present (even empty), count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.md` file into its TOML frontmatter and Markdown body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    match check_scenario(&config, source) {
        Some(reason) => fail(config.description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description: config.description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Check every expectation in `config` against `source`. Returns the first
/// mismatch.
fn check_scenario(config: &TestConfig, source: &str) -> Option<String> {
    let blocks = parse(source);
    let normalized = serialize(&blocks);

    if let Some(expected) = &config.expect_blocks {
        let actual: Vec<&str> = blocks.iter().map(Block::kind_name).collect();
        if actual != *expected {
            return Some(format!(
                "block mismatch\n  expected: [{}]\n  actual:   [{}]",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if let Some(expected) = &config.expect_normalized {
        if normalized.trim() != expected.trim() {
            return Some(format!(
                "normalized output mismatch\n  expected:\n{}\n  actual:\n{}",
                indent(expected.trim()),
                indent(normalized.trim())
            ));
        }
    }

    if let Some(expected) = &config.expect_sections {
        let actual = extract(source);
        if actual != *expected {
            return Some(format!(
                "section mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    if config.expect_roundtrip {
        let reparsed = parse(&normalized);
        if reparsed != blocks {
            return Some(format!(
                "round trip changed the document\n  before: {:?}\n  after:  {:?}",
                blocks, reparsed
            ));
        }
    }

    if let Some(expected) = &config.expect_warnings {
        let warnings = duplicate_sections(source, 0);
        return check_warnings(source, &warnings, expected);
    }

    None
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}

fn check_warnings(
    source: &str,
    actual: &[SectionWarning],
    expected: &[ExpectedWarning],
) -> Option<String> {
    if actual.len() != expected.len() {
        let mut report = format!(
            "warning count mismatch: expected {}, got {}",
            expected.len(),
            actual.len()
        );
        for warning in actual {
            let line = line_of(source, warning.span.start);
            report.push_str(&format!("\n    - line {}: {}", line, warning.message));
        }
        return Some(report);
    }

    actual
        .iter()
        .zip(expected)
        .enumerate()
        .find_map(|(i, (warning, expected))| {
            let line = line_of(source, warning.span.start);
            if !warning.message.contains(&expected.contains) {
                Some(format!(
                    "warning #{}: \"{}\" does not mention \"{}\"",
                    i + 1,
                    warning.message,
                    expected.contains
                ))
            } else if let Some(want) = expected.line.filter(|&want| want != line) {
                Some(format!(
                    "warning #{}: reported on line {}, expected line {}",
                    i + 1,
                    line,
                    want
                ))
            } else {
                None
            }
        })
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// A single file, or files directly in `root`, get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if root.is_file() {
        categories.insert(String::new(), vec![root.to_path_buf()]);
        return categories;
    }
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

fn paint(text: &str, ansi: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", ansi, text)
    }
}

/// Keep the categories named in `requested` (and their subcategories).
/// An empty request keeps everything.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files);
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.md` files under `path` (or a single file).
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let all = discover_categorized(path);
    if all.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    let selected = select_categories(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &selected {
        eprintln!();
        eprintln!("{}", paint(category_label(category), "1", no_color));

        for file in *files {
            let result = run_single_test(file);
            let label = result.description.clone().unwrap_or_else(|| {
                file.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("?")
                    .to_string()
            });

            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), label);
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), label);
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            paint("ok", "32", no_color),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
