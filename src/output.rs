//! Emission of selection results for later pipeline steps
//!
//! Results are written as `key=value` lines, the format consumed from
//! `$GITHUB_OUTPUT`. All lines are rendered up front and written in a single
//! call so a failed selection never leaves partial output behind.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use indexmap::IndexMap;
#[cfg(test)]
use mockall::automock;

use crate::artifact::resolver::SelectionResult;

pub const NEW_APK_PATH: &str = "new_apk_path";
pub const OLD_APK_PATH: &str = "old_apk_path";
pub const NEW_APK_NAME: &str = "new_apk_name";
pub const OLD_APK_NAME: &str = "old_apk_name";
pub const NEW_VERSION: &str = "new_version";
pub const OLD_VERSION: &str = "old_version";

impl SelectionResult {
    /// Output pairs in emission order; old-side values are empty outside upgrade mode
    pub fn outputs(&self) -> IndexMap<&'static str, String> {
        let (old_path, old_name) = self
            .old
            .as_ref()
            .map(|c| (c.name.clone(), c.basename.clone()))
            .unwrap_or_default();

        IndexMap::from([
            (NEW_APK_PATH, self.new.name.clone()),
            (OLD_APK_PATH, old_path),
            (NEW_APK_NAME, self.new.basename.clone()),
            (OLD_APK_NAME, old_name),
            (NEW_VERSION, self.new_label.clone()),
            (OLD_VERSION, self.old_label.clone()),
        ])
    }
}

/// Render pairs as `key=value` lines
pub fn render_lines(outputs: &IndexMap<&'static str, String>) -> String {
    outputs
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

/// Destination for rendered output
#[cfg_attr(test, automock)]
pub trait OutputSink {
    fn emit(&mut self, rendered: &str) -> std::io::Result<()>;
}

/// Appends to a file, creating it if needed
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for FileSink {
    fn emit(&mut self, rendered: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(rendered.as_bytes())?;
        file.flush()
    }
}

pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, rendered: &str) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()
    }
}

/// Write a selection result as `key=value` lines to `sink`
pub fn emit_result<S: OutputSink + ?Sized>(
    sink: &mut S,
    result: &SelectionResult,
) -> std::io::Result<()> {
    sink.emit(&render_lines(&result.outputs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::candidate::Candidate;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn upgrade_result() -> SelectionResult {
        SelectionResult {
            new: Candidate::new("builds/wire-v4.21.0-73937.apk"),
            old: Some(Candidate::new("builds/wire-v4.20.1-73000.apk")),
            new_label: "4.21.0-73937".to_string(),
            old_label: "4.20.1-73000".to_string(),
        }
    }

    #[test]
    fn outputs_are_ordered_and_complete() {
        let outputs = upgrade_result().outputs();

        assert_eq!(
            outputs.into_iter().collect::<Vec<_>>(),
            vec![
                (NEW_APK_PATH, "builds/wire-v4.21.0-73937.apk".to_string()),
                (OLD_APK_PATH, "builds/wire-v4.20.1-73000.apk".to_string()),
                (NEW_APK_NAME, "wire-v4.21.0-73937.apk".to_string()),
                (OLD_APK_NAME, "wire-v4.20.1-73000.apk".to_string()),
                (NEW_VERSION, "4.21.0-73937".to_string()),
                (OLD_VERSION, "4.20.1-73000".to_string()),
            ]
        );
    }

    #[test]
    fn outputs_leave_old_side_empty_without_upgrade() {
        let result = SelectionResult {
            old: None,
            old_label: String::new(),
            ..upgrade_result()
        };

        let outputs = result.outputs();

        assert_eq!(outputs[OLD_APK_PATH], "");
        assert_eq!(outputs[OLD_APK_NAME], "");
        assert_eq!(outputs[OLD_VERSION], "");
        assert_eq!(outputs.len(), 6);
    }

    #[test]
    fn emit_result_writes_once() {
        let mut sink = MockOutputSink::new();
        sink.expect_emit()
            .with(eq(concat!(
                "new_apk_path=builds/wire-v4.21.0-73937.apk\n",
                "old_apk_path=builds/wire-v4.20.1-73000.apk\n",
                "new_apk_name=wire-v4.21.0-73937.apk\n",
                "old_apk_name=wire-v4.20.1-73000.apk\n",
                "new_version=4.21.0-73937\n",
                "old_version=4.20.1-73000\n",
            )))
            .times(1)
            .returning(|_| Ok(()));

        emit_result(&mut sink, &upgrade_result()).unwrap();
    }

    #[test]
    fn file_sink_appends_to_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("github_output");
        std::fs::write(&path, "previous=step\n").unwrap();

        let mut sink = FileSink::new(&path);
        sink.emit("new_version=1.0.0\n").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "previous=step\nnew_version=1.0.0\n"
        );
    }
}
