use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured result of one research query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResearchRecord {
    /// the subject researched
    pub topic: String,
    /// the synthesized findings
    pub summary: String,
    /// citations or URLs, in citation order
    pub sources: Vec<String>,
    /// names of the tools that contributed
    #[serde(alias = "toolsUsed")]
    pub tools_used: Vec<String>,
}

impl fmt::Display for ResearchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Topic: {}", self.topic)?;
        writeln!(f, "Summary: {}", self.summary)?;
        writeln!(f, "Sources:")?;
        for source in &self.sources {
            writeln!(f, "  - {}", source)?;
        }
        write!(f, "Tools used: {}", self.tools_used.join(", "))
    }
}
