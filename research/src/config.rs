use crate::error::{Error, Result};
use crate::research::FALLBACK_FILE;
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

const QUERY_PROMPT: &str = "What can i help you research? ";

#[derive(Parser, Debug)]
#[command(name = "research", about = "Research a topic with a tool-calling LLM agent")]
pub struct Cli {
    /// research query; read from stdin when omitted
    pub query: Option<String>,

    #[arg(long, env = "RESEARCH_MODEL", default_value = "gpt-4")]
    pub model: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// directory the save tool writes into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// file receiving the raw answer when it cannot be parsed
    #[arg(long, default_value = FALLBACK_FILE)]
    pub fallback_file: String,

    #[arg(long, default_value_t = agent::DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// number of web search results handed to the model
    #[arg(long, default_value_t = 5)]
    pub search_results: usize,

    #[arg(long, default_value_t = 1)]
    pub wiki_top_k: usize,

    #[arg(long, default_value_t = 100)]
    pub wiki_max_chars: usize,

    /// do not print the agent trace
    #[arg(long)]
    pub quiet: bool,
}

impl Cli {
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(
                "OPENAI_API_KEY is not set; export it or add it to .env".to_string(),
            )),
        }
    }

    /// The fallback file is written by the save tool, which only accepts bare
    /// file names inside `--output-dir`.
    pub fn fallback_file(&self) -> Result<&str> {
        if agent::tools::is_plain_filename(&self.fallback_file) {
            Ok(&self.fallback_file)
        } else {
            Err(Error::Config(format!(
                "--fallback-file {} must be a bare file name, set the directory with --output-dir",
                self.fallback_file
            )))
        }
    }

    /// The query from the command line, or one line prompted for on stdin.
    pub fn query<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W) -> Result<String> {
        let query = match &self.query {
            Some(query) => query.clone(),
            None => {
                write!(out, "{}", QUERY_PROMPT)?;
                out.flush()?;
                let mut line = String::new();
                input.read_line(&mut line)?;
                line
            }
        };

        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Config("the research query is empty".to_string()));
        }
        Ok(query.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use crate::error::{Error, Result};
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("research").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = cli(&["--api-key", "sk-test"]);
        assert_eq!(cli.fallback_file, "research_fallback.txt");
        assert_eq!(cli.max_iterations, 15);
        assert_eq!(cli.wiki_top_k, 1);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let cli = cli(&["--api-key", " "]);
        assert!(matches!(cli.api_key(), Err(Error::Config(_))));
    }

    #[test]
    fn test_fallback_file_must_be_bare() -> Result<()> {
        assert_eq!(cli(&["--fallback-file", "fb.txt"]).fallback_file()?, "fb.txt");
        assert!(matches!(
            cli(&["--fallback-file", "out/fb.txt"]).fallback_file(),
            Err(Error::Config(msg)) if msg.contains("--output-dir")
        ));
        Ok(())
    }

    #[test]
    fn test_query_from_stdin() -> Result<()> {
        let cli = cli(&[]);
        let mut input = "History of the Roman aqueducts\n".as_bytes();
        let mut out = Vec::new();

        let query = cli.query(&mut input, &mut out)?;

        assert_eq!(query, "History of the Roman aqueducts");
        assert_eq!(out, b"What can i help you research? ");
        Ok(())
    }

    #[test]
    fn test_empty_query_rejected() {
        let cli = cli(&["   "]);
        let mut out = Vec::new();
        assert!(matches!(
            cli.query(&mut "".as_bytes(), &mut out),
            Err(Error::Config(_))
        ));
    }
}
