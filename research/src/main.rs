mod config;
mod error;
mod record;
mod research;

use agent::callbacks::{Callback, MessageLogger};
use agent::tools::{BoxedTool, DuckDuckGoSearch, SaveTextToFile, WikipediaLookup};
use clap::Parser;
use error::{Error, Result};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // a missing .env is fine, the variables may come from the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match run(config::Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        // already reported together with the raw response
        Err(Error::ResponseParse(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: config::Cli) -> Result<()> {
    let fallback_file = cli.fallback_file()?.to_string();
    let llm = agent::llm::OpenAI::new(cli.model.clone(), cli.api_key()?, cli.base_url.as_deref())
        .map_err(Error::Setup)?;

    let query = cli.query(&mut std::io::stdin().lock(), &mut std::io::stdout())?;

    let tools: Vec<BoxedTool> = vec![
        DuckDuckGoSearch::new(cli.search_results).map_err(Error::Setup)?,
        WikipediaLookup::new(cli.wiki_top_k, cli.wiki_max_chars).map_err(Error::Setup)?,
        SaveTextToFile::new(&cli.output_dir),
    ];

    let mut callbacks: Vec<Box<dyn Callback + Send>> = Vec::new();
    if !cli.quiet {
        callbacks.push(MessageLogger::new(std::io::stdout()));
    }

    let mut researcher = research::Researcher::new(
        llm,
        tools,
        callbacks,
        cli.max_iterations,
        fallback_file.clone(),
    )
    .map_err(Error::Setup)?;

    tracing::info!(model = %cli.model, "starting research run");
    let outcome = researcher.run(&query).await?;

    research::report(&outcome, &fallback_file, &mut std::io::stdout())?;

    match outcome {
        research::Outcome::Success { .. } => Ok(()),
        research::Outcome::Failure { error, .. } => Err(Error::ResponseParse(error)),
    }
}
