//! Structured output parsing: turns free-form model text into a typed value
//! described by a JSON Schema.

use regex::Regex;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::LazyLock;
use thiserror::Error;

// fences only count when they open and close a line
static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*```(?:json|JSON)?[ \t]*\n([\s\S]*?)\n[ \t]*```[ \t]*$")
        .expect("valid regex")
});

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("output is empty")]
    Empty,

    #[error("no JSON object found in output")]
    NoStructuredData,

    #[error("malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("output does not match the expected schema: {0}")]
    Mismatch(#[source] serde_json::Error),
}

pub struct OutputParser<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for OutputParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OutputParser<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: JsonSchema + DeserializeOwned> OutputParser<T> {
    /// Instructions embedded in the prompt telling the model exactly how to
    /// shape its final answer.
    pub fn format_instructions(&self) -> String {
        let schema = schema_for!(T);
        let schema = serde_json::to_string_pretty(&schema).unwrap_or_default();

        format!(
            "The output should be formatted as a JSON instance that conforms to the JSON schema below.

As an example, for the schema {{\"properties\": {{\"foo\": {{\"title\": \"Foo\", \"description\": \"a list of strings\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}
the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.

Here is the output schema:
```
{}
```",
            schema
        )
    }

    /// Tries every candidate from [`candidates`] in order and returns the
    /// first one that deserializes into `T`.
    pub fn parse(&self, text: &str) -> Result<T, ParseError> {
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut mismatch = None;
        let mut malformed = None;

        for candidate in candidates(text) {
            match serde_json::from_str(candidate) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_data() => {
                    mismatch.get_or_insert(e);
                }
                Err(e) => malformed = Some(e),
            }
        }

        // a well-formed object of the wrong shape says more than a syntax error
        match (mismatch, malformed) {
            (Some(e), _) => Err(ParseError::Mismatch(e)),
            (None, Some(e)) => Err(ParseError::Malformed(e)),
            (None, None) => Err(ParseError::NoStructuredData),
        }
    }
}

/// Possible serialized objects in `text`, most likely first: the whole text,
/// the body of each fenced code block, then the balanced `{...}` opening at
/// each brace.
fn candidates(text: &str) -> Vec<&str> {
    let mut found = Vec::new();

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        found.push(trimmed);
    }

    for caps in CODE_FENCE_RE.captures_iter(text) {
        if let Some(body) = caps.get(1) {
            let body = body.as_str().trim();
            if body.starts_with('{') && !found.contains(&body) {
                found.push(body);
            }
        }
    }

    for (start, _) in text.match_indices('{') {
        let candidate = balanced_object(&text[start..]);
        if !found.contains(&candidate) {
            found.push(candidate);
        }
    }

    found
}

/// The object opening at the start of `text`, or all of `text` when it never
/// closes so the deserializer can report where it breaks.
fn balanced_object(text: &str) -> &str {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[..=i];
                }
            }
            _ => {}
        }
    }

    text
}
