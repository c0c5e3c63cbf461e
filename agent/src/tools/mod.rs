use crate::{Error, Result};
use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use std::collections::HashMap;

mod save;
pub use save::{DEFAULT_SAVE_FILE, SaveTextToFile, is_plain_filename};

mod search;
pub use search::DuckDuckGoSearch;

mod wiki;
pub use wiki::WikipediaLookup;

#[derive(Clone, Debug)]
pub struct ToolDefinition {
    pub name: String,
    pub desc: String,
    pub params: serde_json::Value,
}

impl ToolDefinition {
    pub fn new<P: JsonSchema>(name: &str, desc: &str) -> Result<Self> {
        let schema = schema_for!(P);
        let params = serde_json::to_value(&schema.schema)?;
        Ok(Self {
            name: name.to_string(),
            desc: desc.to_string(),
            params,
        })
    }
}

#[derive(Clone, Debug, PartialEq, std::hash::Hash)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: String,
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "- {} ({})\n\t- `{}\n`", self.name, self.id, self.args)
    }
}

pub fn parse_args<O: for<'de> serde::Deserialize<'de>>(tool: &str, args: &str) -> Result<O> {
    serde_json::from_str(args).map_err(|e| Error::InvalidToolArgs {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// A named text-in/text-out capability the agent can call.
#[async_trait]
pub trait Tool {
    fn definition(&self) -> Result<ToolDefinition>;

    /// `args` is the JSON-encoded argument object produced by the model.
    async fn invoke(&mut self, args: &str) -> Result<String>;
}

pub type BoxedTool = Box<dyn Tool + Send>;

/// Closed set of tools addressed by name.
pub struct ToolSet {
    tools: HashMap<String, BoxedTool>,
    defs: Vec<ToolDefinition>,
}

impl ToolSet {
    pub fn new(tools: Vec<BoxedTool>) -> Result<Self> {
        let mut defs = Vec::new();
        let mut by_name = HashMap::new();

        for tool in tools {
            let def = tool.definition()?;
            if by_name.contains_key(&def.name) {
                return Err(Error::MissingArg(format!(
                    "tool {} registered twice",
                    def.name
                )));
            }
            by_name.insert(def.name.clone(), tool);
            defs.push(def);
        }

        Ok(Self {
            tools: by_name,
            defs,
        })
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.defs
    }

    pub fn names(&self) -> Vec<&str> {
        self.defs.iter().map(|def| def.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub async fn invoke(&mut self, name: &str, args: &str) -> Result<String> {
        let tool = self
            .tools
            .get_mut(name)
            .ok_or(Error::ToolDoesNotExist(name.to_string()))?;

        tracing::debug!(tool = name, args, "invoking tool");
        tool.invoke(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::{Tool, ToolDefinition, ToolSet};
    use crate::{Error, Result};
    use async_trait::async_trait;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    struct EchoArgs {
        text: String,
    }

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> Result<ToolDefinition> {
            ToolDefinition::new::<EchoArgs>("echo", "repeat the text")
        }

        async fn invoke(&mut self, args: &str) -> Result<String> {
            let args: EchoArgs = super::parse_args("echo", args)?;
            Ok(args.text)
        }
    }

    #[tokio::test]
    async fn test_invoke_by_name() -> Result<()> {
        let mut tools = ToolSet::new(vec![Box::new(Echo)])?;

        assert_eq!(tools.names(), vec!["echo"]);
        assert_eq!(tools.invoke("echo", "{\"text\":\"hi\"}").await?, "hi");

        let params = &tools.definitions()[0].params;
        assert_eq!(params["required"][0], "text");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_args() -> Result<()> {
        let mut tools = ToolSet::new(vec![Box::new(Echo)])?;

        assert!(matches!(
            tools.invoke("nope", "{}").await,
            Err(Error::ToolDoesNotExist(name)) if name == "nope"
        ));
        assert!(matches!(
            tools.invoke("echo", "{}").await,
            Err(Error::InvalidToolArgs { tool, .. }) if tool == "echo"
        ));
        Ok(())
    }

    #[test]
    fn test_duplicate_names_rejected() {
        assert!(ToolSet::new(vec![Box::new(Echo), Box::new(Echo)]).is_err());
    }
}
