use crate::Result;
use crate::callbacks::Callback;
use crate::llm::{Content, Message};
use std::io::Write;

/// Verbose trace of an agent run, printing each message once as it appears.
pub struct MessageLogger<W: Write + Send> {
    writer: W,
    printed: usize,
    step: u32,
}

impl<W: Write + Send> MessageLogger<W> {
    pub fn new(writer: W) -> Box<Self> {
        Box::new(Self {
            writer,
            printed: 0,
            step: 0,
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Callback for MessageLogger<W> {
    fn on_start(&mut self, query: &str) -> Result<()> {
        self.printed = 0;
        self.step = 0;
        write!(self.writer, "\n> Entering new agent run...\n**User**: {}\n", query)?;
        self.writer.flush()?;
        Ok(())
    }

    fn on_step(&mut self, scratchpad: &[Message]) -> Result<()> {
        // the scratchpad only grows during a run
        let start = self.printed.min(scratchpad.len());

        write!(self.writer, "### Step {}\n", self.step)?;
        scratchpad[start..]
            .iter()
            .try_for_each(|m| write!(self.writer, "{}", m))?;
        self.writer.flush()?;

        self.step += 1;
        self.printed = scratchpad.len();
        Ok(())
    }

    fn on_finish(&mut self, _output: &Content) -> Result<()> {
        write!(self.writer, "\n> Finished agent run.\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
