use crate::llm::Message;
use crate::{Error, Result};

/// Chat prompt made of a system template followed by the conversation
/// history, the user query and the agent scratchpad.
#[derive(Clone, Debug)]
pub struct ChatPrompt {
    system: String,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    /// Fills the `{name}` slot of the system template. The inserted value is
    /// not scanned for further slots.
    pub fn partial(mut self, name: &str, value: &str) -> Result<Self> {
        let slot = format!("{{{}}}", name);
        if !self.system.contains(&slot) {
            return Err(Error::MissingArg(format!(
                "prompt has no {} placeholder",
                slot
            )));
        }
        self.system = self.system.replace(&slot, value);
        Ok(self)
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn render(
        &self,
        chat_history: &[Message],
        query: &str,
        scratchpad: &[Message],
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(chat_history.len() + scratchpad.len() + 2);
        messages.push(Message::System(self.system.clone()));
        messages.extend_from_slice(chat_history);
        messages.push(Message::User(query.to_string()));
        messages.extend_from_slice(scratchpad);
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::ChatPrompt;
    use crate::Result;
    use crate::llm::Message;

    #[test]
    fn test_partial_fills_slot_once() -> Result<()> {
        let prompt = ChatPrompt::new("Answer like this:\n{format_instructions}")
            .partial("format_instructions", "{\"format_instructions\": {}}")?;

        assert_eq!(
            prompt.system(),
            "Answer like this:\n{\"format_instructions\": {}}"
        );
        assert!(ChatPrompt::new("no slots").partial("x", "y").is_err());
        Ok(())
    }

    #[test]
    fn test_render_order() {
        let prompt = ChatPrompt::new("sys");
        let history = vec![
            Message::User("earlier".to_string()),
            Message::Assistant("reply".to_string(), vec![]),
        ];
        let scratchpad = vec![Message::Tool {
            id: "1".to_string(),
            name: "search".to_string(),
            result: "found".to_string(),
        }];

        let messages = prompt.render(&history, "now", &scratchpad);

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], Message::System("sys".to_string()));
        assert_eq!(messages[1], history[0]);
        assert_eq!(messages[3], Message::User("now".to_string()));
        assert_eq!(messages[4], scratchpad[0]);

        assert_eq!(prompt.render(&[], "q", &[]).len(), 2);
    }
}
