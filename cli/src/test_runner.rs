use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use fmxml::ComposeError;

const CASE_SUFFIX: &str = ".test.txt";
const FENCE: &str = "---";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedDiagnostic {
    /// Substring that must appear in the message.
    pub contains: String,

    /// If set, the diagnostic must be reported on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Script text in, XML out.
    #[default]
    Compose,
    /// XML in, script text out.
    Decompile,
    /// Script text in, composed and decompiled again.
    Roundtrip,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub mode: Mode,

    /// Expected exact output (trimmed comparison). A roundtrip case without it
    /// must reproduce its own input.
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Substrings that must all appear in the output.
    #[serde(default)]
    pub expect_contains: Vec<String>,

    /// Expected errors. If absent, any error fails the case.
    #[serde(default)]
    pub expect_errors: Option<Vec<ExpectedDiagnostic>>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedDiagnostic>>,
}

/// Split a case file into its TOML header and the input that follows it.
///
/// The header sits between two `---` lines at the top of the file.
fn split_frontmatter(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let mut lines = content.split_inclusive('\n');

    let first = lines.next().unwrap_or_default();
    if first.trim_end() != FENCE {
        return Err("missing opening --- frontmatter delimiter".into());
    }
    let mut consumed = first.len();

    let mut header = String::new();
    loop {
        let Some(line) = lines.next() else {
            return Err("missing closing --- frontmatter delimiter".into());
        };
        consumed += line.len();
        if line.trim_end() == FENCE {
            break;
        }
        header.push_str(line);
    }

    let config = toml::from_str(&header).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, &content[consumed..]))
}

/// A message with the line it was reported on, if any.
#[derive(Debug, Clone, PartialEq)]
struct Reported {
    message: String,
    line: Option<usize>,
}

/// What running one case produced.
#[derive(Debug, Default)]
struct Run {
    output: Option<String>,
    errors: Vec<Reported>,
    warnings: Vec<Reported>,
}

fn compose_errors(error: ComposeError) -> Vec<Reported> {
    match error {
        ComposeError::Recognition(errors) => errors
            .into_iter()
            .map(|e| Reported { message: e.message, line: Some(e.line) })
            .collect(),
        ComposeError::Structure(result) => result
            .errors
            .into_iter()
            .map(|e| Reported { message: e.message, line: Some(e.line) })
            .collect(),
    }
}

fn execute(mode: Mode, source: &str) -> Run {
    let mut run = Run::default();

    let xml = match mode {
        Mode::Decompile => source.to_string(),
        Mode::Compose | Mode::Roundtrip => match fmxml::compose(source) {
            Ok(composed) => {
                run.warnings = composed
                    .warnings
                    .iter()
                    .map(|w| Reported {
                        message: w.message.clone(),
                        line: Some(w.line).filter(|line| *line > 0),
                    })
                    .collect();
                composed.xml
            }
            Err(error) => {
                run.errors = compose_errors(error);
                return run;
            }
        },
    };

    if mode == Mode::Compose {
        run.output = Some(xml);
        return run;
    }

    match fmxml::decompile(&xml) {
        Ok(text) => run.output = Some(text),
        Err(error) => run.errors.push(Reported { message: error.to_string(), line: None }),
    }
    run
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

impl TestResult {
    /// The description, or the file name without its suffix.
    fn label(&self) -> &str {
        if let Some(description) = &self.description {
            return description;
        }
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.trim_end_matches(CASE_SUFFIX))
            .unwrap_or("?")
    }
}

fn run_case(path: &Path) -> TestResult {
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read file: {}", e))
        .and_then(|content| {
            let (config, source) = split_frontmatter(&content).map_err(|e| format!("frontmatter error: {}", e))?;
            Ok((config, source.to_string()))
        });

    let (description, outcome) = match loaded {
        Ok((config, source)) => {
            let run = execute(config.mode, &source);
            let outcome = match check_run(&config, &source, &run) {
                Some(reason) => TestOutcome::Fail(reason),
                None => TestOutcome::Pass,
            };
            (config.description, outcome)
        }
        Err(reason) => (None, TestOutcome::Fail(reason)),
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Compare a run against the case's expectations. Returns `Some(reason)` on mismatch.
fn check_run(config: &TestConfig, source: &str, run: &Run) -> Option<String> {
    match &config.expect_errors {
        Some(expected) => {
            if let Some(reason) = check_reported("error", &run.errors, expected) {
                return Some(reason);
            }
        }
        None if !run.errors.is_empty() => {
            let msgs: Vec<String> = run.errors.iter().map(describe).collect();
            return Some(format!("unexpected error(s): {}", msgs.join("; ")));
        }
        None => {}
    }

    if let Some(expected) = &config.expect_warnings
        && let Some(reason) = check_reported("warning", &run.warnings, expected)
    {
        return Some(reason);
    }

    let Some(output) = &run.output else {
        return None;
    };
    let actual = output.trim();

    let expected_output = match (&config.expect_output, config.mode) {
        (Some(expected), _) => Some(expected.trim()),
        (None, Mode::Roundtrip) => Some(source.trim()),
        (None, _) => None,
    };
    if let Some(expected) = expected_output
        && actual != expected
    {
        return Some(format!(
            "output mismatch\n  expected: {}\n  actual:   {}",
            expected, actual
        ));
    }

    for needle in &config.expect_contains {
        if !actual.contains(needle.as_str()) {
            return Some(format!("output does not contain \"{}\"\n  actual: {}", needle, actual));
        }
    }

    None
}

fn describe(reported: &Reported) -> String {
    match reported.line {
        Some(line) => format!("line {}: {}", line, reported.message),
        None => reported.message.clone(),
    }
}

/// Check that reported errors or warnings match expectations, in order.
fn check_reported(kind: &str, actual: &[Reported], expected: &[ExpectedDiagnostic]) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|r| format!("  - {}", describe(r))).collect();
        return Some(format!(
            "expected {} {}(s), got {}\n  actual:\n{}",
            expected.len(),
            kind,
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "{}[{}]: expected message containing \"{}\", got: {}",
                kind, i, expected.contains, actual.message
            ));
        }

        if let Some(expected_line) = expected.line
            && actual.line != Some(expected_line)
        {
            return Some(format!(
                "{}[{}]: expected on line {}, got {}",
                kind,
                i,
                expected_line,
                actual.line.map_or("no line".to_string(), |l| format!("line {}", l))
            ));
        }
    }

    None
}

/// Case files under `root`, keyed by their folder relative to `root` (`""` for the root itself).
fn discover(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut suites: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in case_files(root) {
        let category = path
            .parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .map(|rel| {
                rel.components()
                    .map(|part| part.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        suites.entry(category).or_default().push(path);
    }
    for files in suites.values_mut() {
        files.sort();
    }
    suites
}

fn case_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            found.extend(case_files(&path));
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(CASE_SUFFIX))
        {
            found.push(path);
        }
    }
    found
}

fn category_names(suites: &BTreeMap<String, Vec<PathBuf>>) -> Vec<&str> {
    suites
        .keys()
        .map(|name| if name.is_empty() { "(root)" } else { name.as_str() })
        .collect()
}

/// `wanted` itself or any folder nested below it.
fn in_category(category: &str, wanted: &str) -> bool {
    category == wanted || category.strip_prefix(wanted).is_some_and(|rest| rest.starts_with('/'))
}

/// Keep the requested categories. Unknown names are reported and skipped.
fn select(suites: BTreeMap<String, Vec<PathBuf>>, wanted: &[String]) -> BTreeMap<String, Vec<PathBuf>> {
    if wanted.is_empty() {
        return suites;
    }
    let wanted: Vec<&str> = wanted.iter().map(|w| w.trim_matches('/')).collect();
    for name in &wanted {
        if !suites.keys().any(|category| in_category(category, name)) {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                name,
                category_names(&suites).join(", ")
            );
        }
    }
    suites
        .into_iter()
        .filter(|(category, _)| wanted.iter().any(|name| in_category(category, name)))
        .collect()
}

/// Print the categories found under `path`.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let suites = discover(path);
    if suites.is_empty() {
        eprintln!("no {} files found in {}", CASE_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (name, (_, files)) in category_names(&suites).into_iter().zip(&suites) {
        eprintln!("  {} ({} tests)", name, files.len());
    }
}

/// ANSI styling for the report; plain text with `--no-color`.
struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1", text)
    }
}

#[derive(Default)]
struct Report {
    passed: usize,
    failures: Vec<TestResult>,
}

impl Report {
    fn record(&mut self, result: TestResult, palette: &Palette) {
        if matches!(result.outcome, TestOutcome::Pass) {
            self.passed += 1;
            eprintln!("  {}  {}", palette.pass(), result.label());
        } else {
            eprintln!("  {}  {}", palette.fail(), result.label());
            self.failures.push(result);
        }
    }

    /// Print failure details and the summary line. Returns the exit code.
    fn finish(self, palette: &Palette) -> i32 {
        if !self.failures.is_empty() {
            eprintln!();
            eprintln!("failures:");
        }
        for failure in &self.failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }

        eprintln!();
        let failed = self.failures.len();
        if failed == 0 {
            eprintln!("test result: {}. {} passed, 0 failed", palette.paint("32", "ok"), self.passed);
            0
        } else {
            eprintln!(
                "test result: {}. {} passed, {} failed (of {})",
                palette.paint("31", "FAILED"),
                self.passed,
                failed,
                self.passed + failed
            );
            1
        }
    }
}

/// Run one case file, or every case under a directory (optionally only some categories).
/// Returns 0 when everything passed, 1 otherwise.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let suites = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let found = discover(path);
        if found.is_empty() {
            eprintln!("no {} files found in {}", CASE_SUFFIX, path.display());
            return 1;
        }
        select(found, categories)
    };
    if suites.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let palette = Palette { color: !no_color };
    let mut report = Report::default();
    for (name, (_, files)) in category_names(&suites).into_iter().zip(&suites) {
        eprintln!();
        eprintln!("{}", palette.heading(name));
        for file in files {
            report.record(run_case(file), &palette);
        }
    }
    report.finish(&palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_case(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn bundled_cases_pass() {
        let cases = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/cases");
        assert_eq!(run_tests(&cases, true, &[]), 0);
    }

    #[test]
    fn frontmatter_splits_config_and_source() {
        let (config, source) =
            split_frontmatter("---\ndescription = \"x\"\nmode = \"roundtrip\"\n---\nLoop\nEnd Loop\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("x"));
        assert_eq!(config.mode, Mode::Roundtrip);
        assert_eq!(source, "Loop\nEnd Loop\n");
    }

    #[test]
    fn frontmatter_errors() {
        assert!(split_frontmatter("Loop").is_err());
        assert!(split_frontmatter("---\nmode = \"compose\"\nLoop").is_err());
        assert!(split_frontmatter("---\nmode = \"sideways\"\n---\nLoop").is_err());
    }

    #[test]
    fn failing_case_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        write_case(
            dir.path(),
            "bad.test.txt",
            "---\nexpect_contains = [\"id=\\\"999\\\"\"]\n---\nLoop\nEnd Loop\n",
        );
        assert_eq!(run_tests(dir.path(), true, &[]), 1);
    }

    #[test]
    fn unexpected_errors_fail() {
        let run = execute(Mode::Compose, "End If");
        let config: TestConfig = toml::from_str("").unwrap();
        let reason = check_run(&config, "End If", &run).unwrap();
        assert!(reason.contains("Orphan End If"));
    }

    #[test]
    fn expected_errors_with_lines() {
        let source = "Loop\nElse\nEnd Loop";
        let run = execute(Mode::Compose, source);
        let config: TestConfig =
            toml::from_str("expect_errors = [{ contains = \"Else without matching If\", line = 2 }]").unwrap();
        assert_eq!(check_run(&config, source, &run), None);

        let wrong_line: TestConfig =
            toml::from_str("expect_errors = [{ contains = \"Else\", line = 3 }]").unwrap();
        assert!(check_run(&wrong_line, source, &run).is_some());
    }

    #[test]
    fn roundtrip_defaults_to_its_own_input() {
        let source = "Loop\n    Halt Script\nEnd Loop\n";
        let run = execute(Mode::Roundtrip, source);
        let config: TestConfig = toml::from_str("mode = \"roundtrip\"").unwrap();
        assert_eq!(check_run(&config, source, &run), None);
    }

    #[test]
    fn categories_filter_by_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let ok = "---\nmode = \"roundtrip\"\n---\nHalt Script\n";
        write_case(dir.path(), "control/a.test.txt", ok);
        write_case(dir.path(), "control/nested/b.test.txt", ok);
        write_case(dir.path(), "records/c.test.txt", "---\nexpect_output = \"nope\"\n---\nHalt Script\n");
        write_case(dir.path(), "records/notes.txt", "not a case");

        let all = discover(dir.path());
        assert_eq!(
            all.keys().cloned().collect::<Vec<_>>(),
            vec!["control".to_string(), "control/nested".to_string(), "records".to_string()]
        );

        assert_eq!(run_tests(dir.path(), true, &["control".to_string()]), 0);
        assert_eq!(run_tests(dir.path(), true, &["records".to_string()]), 1);
        assert_eq!(run_tests(dir.path(), true, &["missing".to_string()]), 1);
    }

    #[test]
    fn single_file_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_case(
            dir.path(),
            "one.test.txt",
            "---\nexpect_warnings = [{ contains = \"No steps found\" }]\n---\n\n",
        );
        assert_eq!(run_tests(&path, true, &[]), 0);
    }
}
