//! Candidate listing input
//!
//! The listing itself is produced by an earlier pipeline step (e.g. `aws s3 ls`
//! or a JSON dump of bucket keys); this module only reads it back.

use std::io::Read;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::artifact::error::SourceError;

/// Path meaning "read from standard input"
pub const STDIN_PATH: &str = "-";

/// Trait for loading the listed artifact identifiers, in listing order
#[cfg_attr(test, automock)]
pub trait CandidateSource {
    fn load(&self) -> Result<Vec<String>, SourceError>;
}

/// JSON array of strings, e.g. `["builds/wire-v1.0.0-1.apk", ...]`
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandidateSource for JsonFileSource {
    fn load(&self) -> Result<Vec<String>, SourceError> {
        parse_json_list(&read_input(&self.path)?)
    }
}

/// One identifier per line, from a file or standard input
pub struct LineListSource {
    path: PathBuf,
}

impl LineListSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandidateSource for LineListSource {
    fn load(&self) -> Result<Vec<String>, SourceError> {
        Ok(parse_line_list(&read_input(&self.path)?))
    }
}

/// Parse a JSON array of strings, rejecting any other shape
pub fn parse_json_list(content: &str) -> Result<Vec<String>, SourceError> {
    let value: Value = serde_json::from_str(content)?;

    let Value::Array(items) = value else {
        return Err(SourceError::InvalidShape(format!(
            "expected an array, found {}",
            json_kind(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(name) => Ok(name),
            other => Err(SourceError::InvalidShape(format!(
                "element {} is {}, not a string",
                index,
                json_kind(&other)
            ))),
        })
        .collect()
}

/// Parse a newline-delimited listing
///
/// Blank lines are skipped. Lines in `aws s3 ls` format
/// (`2024-01-31 10:00:00   12345 builds/wire.apk`) contribute their key column.
pub fn parse_line_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| s3_ls_key(line).unwrap_or(line).to_string())
        .collect()
}

fn s3_ls_key(line: &str) -> Option<&str> {
    let mut fields = line.split_whitespace();
    let date = fields.next()?;
    let time = fields.next()?;
    let size = fields.next()?;

    let looks_like_ls = date.len() == 10
        && date.as_bytes().get(4) == Some(&b'-')
        && time.contains(':')
        && size.chars().all(|c| c.is_ascii_digit());
    if !looks_like_ls {
        return None;
    }

    // Keys may contain spaces: take everything after the size column
    let rest = line[date.len()..].trim_start();
    let rest = rest[time.len()..].trim_start();
    let key = rest[size.len()..].trim();
    (!key.is_empty()).then_some(key)
}

fn read_input(path: &Path) -> Result<String, SourceError> {
    if path == Path::new(STDIN_PATH) {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_json_list_accepts_array_of_strings() {
        let names = parse_json_list(r#"["b/a-v1.0.0.apk", "b/notes.txt"]"#).unwrap();

        assert_eq!(names, vec!["b/a-v1.0.0.apk", "b/notes.txt"]);
    }

    #[test]
    fn parse_json_list_accepts_empty_array() {
        assert_eq!(parse_json_list("[]").unwrap(), Vec::<String>::new());
    }

    #[rstest]
    #[case(r#"{"files": []}"#, "expected an array, found an object")]
    #[case(r#""a.apk""#, "expected an array, found a string")]
    #[case(r#"["a.apk", 3]"#, "element 1 is a number, not a string")]
    #[case(r#"["a.apk", null]"#, "element 1 is null, not a string")]
    fn parse_json_list_rejects_wrong_shape(#[case] content: &str, #[case] expected: &str) {
        let err = parse_json_list(content).unwrap_err();

        assert!(
            matches!(&err, SourceError::InvalidShape(msg) if msg == expected),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn parse_json_list_reports_malformed_json() {
        assert!(matches!(
            parse_json_list("[\"a.apk\""),
            Err(SourceError::Json(_))
        ));
    }

    #[rstest]
    #[case("a.apk\nb.apk\n", vec!["a.apk", "b.apk"])]
    #[case("  a.apk  \n\n\r\nb.apk", vec!["a.apk", "b.apk"])]
    #[case(
        "2024-01-31 10:00:00   12345 builds/wire-v1.0.0.apk\n2024-02-01 09:30:12 9 builds/my app.apk",
        vec!["builds/wire-v1.0.0.apk", "builds/my app.apk"]
    )]
    #[case("                           PRE builds/", vec!["PRE builds/"])]
    #[case("release notes.apk", vec!["release notes.apk"])]
    #[case("", vec![])]
    fn parse_line_list_returns_expected(#[case] content: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_line_list(content), expected);
    }

    #[test]
    fn json_file_source_loads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["a-v1.0.0.apk"]"#).unwrap();

        let names = JsonFileSource::new(file.path()).load().unwrap();

        assert_eq!(names, vec!["a-v1.0.0.apk"]);
    }

    #[test]
    fn line_list_source_loads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a-v1.0.0.apk").unwrap();
        writeln!(file, "a-v1.0.1.apk").unwrap();

        let names = LineListSource::new(file.path()).load().unwrap();

        assert_eq!(names, vec!["a-v1.0.0.apk", "a-v1.0.1.apk"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = JsonFileSource::new("/nonexistent/candidates.json").load();

        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
