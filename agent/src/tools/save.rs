use crate::tools::{Tool, ToolDefinition, parse_args};
use crate::{Error, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_SAVE_FILE: &str = "research_output.txt";

const NAME: &str = "save_text_to_file";

#[derive(Deserialize, JsonSchema)]
struct SaveArgs {
    /// text to persist
    data: String,
    /// name of the file to append to
    #[serde(default)]
    filename: Option<String>,
}

/// True when `filename` names a file without any directory part, the only
/// form [`SaveTextToFile`] accepts.
pub fn is_plain_filename(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    !filename.chars().any(std::path::is_separator)
        && matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
}

/// Appends timestamped blocks of text to files inside one directory.
pub struct SaveTextToFile {
    dir: PathBuf,
}

impl SaveTextToFile {
    pub fn new(dir: impl Into<PathBuf>) -> Box<Self> {
        Box::new(Self { dir: dir.into() })
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if !is_plain_filename(filename) {
            return Err(Error::InvalidToolArgs {
                tool: NAME.to_string(),
                reason: format!("filename {} must not contain directories", filename),
            });
        }

        Ok(self.dir.join(filename))
    }

    pub fn save(&self, data: &str, filename: &str) -> Result<String> {
        let path = self.resolve(filename)?;
        std::fs::create_dir_all(&self.dir)?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let block = format!(
            "--- Research Output ---\nTimestamp: {}\n\n{}\n\n",
            timestamp, data
        );

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(block.as_bytes())?;
        file.flush()?;

        tracing::info!(path = %path.display(), bytes = block.len(), "saved research text");

        Ok(format!("Data successfully saved to {}", filename))
    }
}

#[async_trait]
impl Tool for SaveTextToFile {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<SaveArgs>(NAME, "Saves structured research data to a text file.")
    }

    async fn invoke(&mut self, args: &str) -> Result<String> {
        let args: SaveArgs = parse_args(NAME, args)?;
        let filename = args.filename.as_deref().unwrap_or(DEFAULT_SAVE_FILE);
        self.save(&args.data, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SAVE_FILE, SaveTextToFile, is_plain_filename};
    use crate::tools::Tool;
    use crate::{Error, Result};

    #[tokio::test]
    async fn test_appends_to_default_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut tool = SaveTextToFile::new(dir.path());

        let msg = tool.invoke("{\"data\":\"first\"}").await?;
        assert_eq!(msg, format!("Data successfully saved to {}", DEFAULT_SAVE_FILE));
        tool.invoke("{\"data\":\"second\",\"filename\":null}").await?;

        let saved = std::fs::read_to_string(dir.path().join(DEFAULT_SAVE_FILE))?;
        assert_eq!(saved.matches("--- Research Output ---").count(), 2);
        assert!(saved.contains("Timestamp: "));
        assert!(saved.find("first") < saved.find("second"));
        Ok(())
    }

    #[tokio::test]
    async fn test_named_file_in_missing_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out");
        let mut tool = SaveTextToFile::new(&out);

        tool.invoke("{\"data\":\"notes\",\"filename\":\"rome.txt\"}")
            .await?;

        let saved = std::fs::read_to_string(out.join("rome.txt"))?;
        assert!(saved.ends_with("notes\n\n"));
        Ok(())
    }

    #[test]
    fn test_plain_filenames() {
        assert!(is_plain_filename("research_fallback.txt"));
        assert!(!is_plain_filename("out/fb.txt"));
        assert!(!is_plain_filename("out/"));
        assert!(!is_plain_filename(""));
    }

    #[test]
    fn test_rejects_paths() {
        let tool = SaveTextToFile::new("/tmp");
        for name in ["../escape.txt", "/etc/passwd", "a/b.txt", ".."] {
            assert!(
                matches!(tool.save("x", name), Err(Error::InvalidToolArgs { .. })),
                "{} should be rejected",
                name
            );
        }
    }
}
