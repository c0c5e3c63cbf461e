use crate::callbacks;
use crate::llm::{self, Content, Message};
use crate::prompt::ChatPrompt;
use crate::tools::{self, ToolSet};
use crate::{Error, Result};
use std::sync::Arc;

pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to iteration limit.";

pub trait StopCondition {
    fn done(&self, scratchpad: &[llm::Message]) -> bool;
}

/// Stops once the model answers without asking for any tool.
pub struct FinalAnswer;

impl StopCondition for FinalAnswer {
    fn done(&self, scratchpad: &[llm::Message]) -> bool {
        matches!(scratchpad.last(), Some(Message::Assistant(_, calls)) if calls.is_empty())
    }
}

type Callback = Box<dyn callbacks::Callback + Send>;

/// Result of one agent run.
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub input: String,
    pub output: Content,
    pub intermediate_steps: Vec<Message>,
}

pub struct Agent {
    llm: Arc<dyn llm::LLM + Send + Sync>,
    prompt: ChatPrompt,
    tools: ToolSet,
    callbacks: Vec<Callback>,
    stop_condition: Box<dyn StopCondition + Send>,
    max_iterations: usize,
}

impl Agent {
    async fn execute_tool_call(&mut self, tool_call: &tools::ToolCall) -> Result<Message> {
        // an unknown tool is the model's mistake, tell it instead of failing the run
        let result = if self.tools.contains(&tool_call.name) {
            self.tools.invoke(&tool_call.name, &tool_call.args).await?
        } else {
            tracing::warn!(tool = %tool_call.name, "model requested an unknown tool");
            format!(
                "{} is not a valid tool, try one of [{}].",
                tool_call.name,
                self.tools.names().join(", ")
            )
        };

        Ok(Message::Tool {
            id: tool_call.id.clone(),
            name: tool_call.name.clone(),
            result,
        })
    }

    /// Runs the tool-calling loop for one query until the stop condition
    /// holds or the iteration budget is spent.
    pub async fn invoke(&mut self, query: &str, chat_history: &[Message]) -> Result<AgentOutput> {
        let mut scratchpad: Vec<Message> = Vec::new();
        let mut output = None;

        for callback in &mut self.callbacks {
            callback.on_start(query)?;
        }

        for iteration in 0..self.max_iterations {
            let messages = self.prompt.render(chat_history, query, &scratchpad);
            let next = self
                .llm
                .completion(llm::CompletionRequest {
                    messages: &messages,
                    tools: self.tools.definitions(),
                })
                .await?;

            tracing::debug!(
                iteration,
                tool_calls = next.tool_calls.len(),
                "model turn completed"
            );

            scratchpad.push(Message::Assistant(
                next.content.normalize().to_string(),
                next.tool_calls.clone(),
            ));

            for tool_call in &next.tool_calls {
                let result = self.execute_tool_call(tool_call).await?;
                scratchpad.push(result);
            }

            for callback in &mut self.callbacks {
                callback.on_step(&scratchpad)?;
            }

            if self.stop_condition.done(&scratchpad) {
                output = Some(next.content);
                break;
            }
        }

        let output = output.unwrap_or_else(|| {
            tracing::warn!(max_iterations = self.max_iterations, "agent hit iteration limit");
            Content::Text(ITERATION_LIMIT_OUTPUT.to_string())
        });

        for callback in &mut self.callbacks {
            callback.on_finish(&output)?;
        }

        Ok(AgentOutput {
            input: query.to_string(),
            output,
            intermediate_steps: scratchpad,
        })
    }

    /// Direct access to the tools, bypassing the model.
    pub fn tools_mut(&mut self) -> &mut ToolSet {
        &mut self.tools
    }
}

pub struct AgentBuilder {
    llm: Option<Arc<dyn llm::LLM + Send + Sync>>,
    prompt: Option<ChatPrompt>,
    tools: Vec<tools::BoxedTool>,
    callbacks: Vec<Callback>,
    stop_condition: Option<Box<dyn StopCondition + Send>>,
    max_iterations: usize,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            prompt: None,
            tools: Vec::new(),
            callbacks: Vec::new(),
            stop_condition: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn llm(mut self, llm: Arc<dyn llm::LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn prompt(mut self, prompt: ChatPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn tool(mut self, tool: tools::BoxedTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<tools::BoxedTool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn stop_condition(mut self, cond: Box<dyn StopCondition + Send>) -> Self {
        self.stop_condition = Some(cond);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> Result<Agent> {
        if self.max_iterations == 0 {
            return Err(Error::MissingArg(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Agent {
            llm: self
                .llm
                .ok_or(Error::MissingArg("llm is required for agent".to_string()))?,
            prompt: self
                .prompt
                .ok_or(Error::MissingArg("prompt is required for agent".to_string()))?,
            tools: ToolSet::new(self.tools)?,
            callbacks: self.callbacks,
            stop_condition: self.stop_condition.unwrap_or_else(|| Box::new(FinalAnswer)),
            max_iterations: self.max_iterations,
        })
    }
}
