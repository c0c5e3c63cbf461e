mod agent;
pub mod callbacks;
mod error;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod tools;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use agent::{
    Agent, AgentBuilder, AgentOutput, DEFAULT_MAX_ITERATIONS, FinalAnswer, ITERATION_LIMIT_OUTPUT,
    StopCondition,
};
