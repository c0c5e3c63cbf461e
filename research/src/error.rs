use agent::parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to set up the agent: {0}")]
    Setup(#[source] agent::Error),

    #[error("Agent invocation failed: {0}")]
    AgentInvocation(#[source] agent::Error),

    #[error("Error parsing response: {0}")]
    ResponseParse(#[from] ParseError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
