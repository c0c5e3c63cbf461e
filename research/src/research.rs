use crate::error::{Error, Result};
use crate::record::ResearchRecord;
use agent::callbacks::Callback;
use agent::llm;
use agent::parser::{OutputParser, ParseError};
use agent::prompt::ChatPrompt;
use agent::tools::{BoxedTool, ToolSet};
use agent::{Agent, AgentBuilder, AgentOutput};
use std::io::Write;
use std::sync::Arc;

pub const FALLBACK_FILE: &str = "research_fallback.txt";
const SAVE_TOOL: &str = "save_text_to_file";

const RESEARCH_PROMPT: &str = include_str!("prompts/research.md");

/// What happened to the raw output after a failed parse.
#[derive(Debug)]
pub enum Fallback {
    /// nothing to save
    Skipped,
    Saved(String),
    Failed(agent::Error),
}

#[derive(Debug)]
pub enum Outcome {
    Success {
        record: ResearchRecord,
        raw: AgentOutput,
    },
    Failure {
        error: ParseError,
        raw: AgentOutput,
        fallback: Fallback,
    },
}

pub struct Researcher {
    agent: Agent,
    parser: OutputParser<ResearchRecord>,
    fallback_file: String,
}

impl Outcome {
    pub fn raw(&self) -> &AgentOutput {
        match self {
            Outcome::Success { raw, .. } | Outcome::Failure { raw, .. } => raw,
        }
    }
}

impl Researcher {
    pub fn new(
        llm: Arc<dyn llm::LLM + Send + Sync>,
        tools: Vec<BoxedTool>,
        callbacks: Vec<Box<dyn Callback + Send>>,
        max_iterations: usize,
        fallback_file: String,
    ) -> agent::Result<Self> {
        let parser = OutputParser::<ResearchRecord>::new();
        let prompt = ChatPrompt::new(RESEARCH_PROMPT)
            .partial("format_instructions", &parser.format_instructions())?;

        let mut builder = AgentBuilder::new()
            .llm(llm)
            .prompt(prompt)
            .tools(tools)
            .max_iterations(max_iterations);
        for callback in callbacks {
            builder = builder.callback(callback);
        }

        Ok(Self {
            agent: builder.build()?,
            parser,
            fallback_file,
        })
    }

    /// One query, one agent run, one parse attempt and at most one fallback
    /// save. Only a failing agent run is returned as an error.
    pub async fn run(&mut self, query: &str) -> Result<Outcome> {
        let output = self
            .agent
            .invoke(query, &[])
            .await
            .map_err(Error::AgentInvocation)?;

        Ok(process(
            output,
            &self.parser,
            self.agent.tools_mut(),
            &self.fallback_file,
        )
        .await)
    }
}

pub async fn process(
    output: AgentOutput,
    parser: &OutputParser<ResearchRecord>,
    tools: &mut ToolSet,
    fallback_file: &str,
) -> Outcome {
    let error = match parser.parse(output.output.normalize()) {
        Ok(record) => {
            return Outcome::Success {
                record,
                raw: output,
            };
        }
        Err(error) => error,
    };

    tracing::warn!(%error, "agent output did not match the research record");

    let fallback = if output.output.is_empty() {
        Fallback::Skipped
    } else {
        let args = serde_json::json!({
            "data": output.output.to_raw_string(),
            "filename": fallback_file,
        });
        match tools.invoke(SAVE_TOOL, &args.to_string()).await {
            Ok(message) => Fallback::Saved(message),
            Err(save_error) => {
                tracing::error!(error = %save_error, "fallback save failed");
                Fallback::Failed(save_error)
            }
        }
    };

    Outcome::Failure {
        error,
        raw: output,
        fallback,
    }
}

pub fn report<W: Write>(outcome: &Outcome, fallback_file: &str, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "\nAttempting to parse: {}",
        outcome.raw().output.normalize()
    )?;

    match outcome {
        Outcome::Success { record, .. } => {
            writeln!(out, "\n=== Structured Response ===")?;
            writeln!(out, "{}", record)?;
        }
        Outcome::Failure {
            error,
            raw,
            fallback,
        } => {
            writeln!(out, "Error parsing response: {}", error)?;
            writeln!(out, "Raw Response: {:?}", raw)?;
            match fallback {
                Fallback::Skipped => {}
                Fallback::Saved(_) => writeln!(out, "Saved raw output to {}", fallback_file)?,
                Fallback::Failed(e) => writeln!(out, "Failed to save fallback: {}", e)?,
            }
        }
    }
    out.flush()?;
    Ok(())
}
