use crate::Result;
use crate::llm::{Content, Message};

mod logger;
pub use logger::MessageLogger;

/// Observes an agent run. `on_step` receives the whole scratchpad after each
/// model turn and its tool calls.
pub trait Callback {
    fn on_start(&mut self, _query: &str) -> Result<()> {
        Ok(())
    }

    fn on_step(&mut self, scratchpad: &[Message]) -> Result<()>;

    fn on_finish(&mut self, _output: &Content) -> Result<()> {
        Ok(())
    }
}
