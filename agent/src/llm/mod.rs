use crate::Result;
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use std::fmt;

mod openai;
pub use openai::OpenAI;

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    User(String),
    Assistant(String, Vec<ToolCall>),
    System(String),
    Tool {
        id: String,
        name: String,
        result: String,
    },
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::User(content) => writeln!(f, "**User**: {}", content),
            Message::System(content) => writeln!(f, "**System**: {}", content),
            Message::Assistant(content, tool_calls) => {
                if !content.is_empty() {
                    writeln!(f, "**Assistant**: {}", content)?;
                }
                for call in tool_calls {
                    writeln!(f, "Invoking: `{}` with `{}`", call.name, call.args)?;
                }
                Ok(())
            }
            Message::Tool { name, result, .. } => writeln!(f, "**Tool** `{}`: {}", name, result),
        }
    }
}

/// The final text of a completion.
///
/// Some providers hand the answer back as a sequence of parts instead of a
/// single string; only the first part is treated as the answer.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Text(String),
    Parts(Vec<String>),
}

impl Content {
    pub fn normalize(&self) -> &str {
        match self {
            Content::Text(text) => text,
            Content::Parts(parts) => parts.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Content::Text(text) => text.is_empty(),
            Content::Parts(parts) => parts.is_empty(),
        }
    }

    /// Raw rendering used when the answer is persisted unparsed.
    pub fn to_raw_string(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => {
                serde_json::to_string(parts).unwrap_or_else(|_| parts.join("\n"))
            }
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

pub struct CompletionResponse {
    pub content: Content,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LLM {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::Content;

    #[test]
    fn test_single_part_matches_text() {
        let text = Content::from("answer");
        let parts = Content::Parts(vec!["answer".to_string()]);

        assert_eq!(text.normalize(), parts.normalize());
        assert!(!parts.is_empty());
    }

    #[test]
    fn test_empty_parts() {
        let parts = Content::Parts(vec![]);
        assert_eq!(parts.normalize(), "");
        assert!(parts.is_empty());
        assert_eq!(parts.to_raw_string(), "[]");
    }
}
