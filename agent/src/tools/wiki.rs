use crate::Result;
use crate::tools::{Tool, ToolDefinition, parse_args};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "wikipedia";
const ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const USER_AGENT: &str = concat!("research-agent/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize, JsonSchema)]
struct WikiArgs {
    /// topic to look up on Wikipedia
    query: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

/// Encyclopedia lookup: the top `top_k` article intros for a query,
/// truncated to `max_chars` characters overall.
pub struct WikipediaLookup {
    client: reqwest::Client,
    top_k: usize,
    max_chars: usize,
}

impl WikipediaLookup {
    pub fn new(top_k: usize, max_chars: usize) -> Result<Box<Self>> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Box::new(Self {
            client,
            top_k,
            max_chars,
        }))
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>> {
        let limit = self.top_k.to_string();
        let res: SearchResponse = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(res.query.search.into_iter().map(|hit| hit.title).collect())
    }

    async fn summary(&self, title: &str) -> Result<Option<Page>> {
        let res: ExtractResponse = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(res.query.pages.into_iter().next())
    }

    pub async fn lookup(&self, query: &str) -> Result<String> {
        let mut pages = Vec::new();
        for title in self.search_titles(query).await? {
            if let Some(page) = self.summary(&title).await? {
                pages.push(page);
            }
        }

        tracing::debug!(query, pages = pages.len(), "wikipedia lookup finished");
        Ok(format_pages(&pages, self.max_chars))
    }
}

fn format_pages(pages: &[Page], max_chars: usize) -> String {
    let summaries: Vec<String> = pages
        .iter()
        .filter_map(|page| {
            let extract = page.extract.as_deref()?.trim();
            if extract.is_empty() {
                return None;
            }
            Some(format!("Page: {}\nSummary: {}", page.title, extract))
        })
        .collect();

    if summaries.is_empty() {
        return "No good Wikipedia Search Result was found".to_string();
    }

    summaries.join("\n\n").chars().take(max_chars).collect()
}

#[async_trait]
impl Tool for WikipediaLookup {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<WikiArgs>(
            NAME,
            "Look up a topic on Wikipedia and return a summary of the best matching article",
        )
    }

    async fn invoke(&mut self, args: &str) -> Result<String> {
        let args: WikiArgs = parse_args(NAME, args)?;
        self.lookup(&args.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtractResponse, Page, format_pages};

    fn page(title: &str, extract: Option<&str>) -> Page {
        Page {
            title: title.to_string(),
            extract: extract.map(str::to_string),
        }
    }

    #[test]
    fn test_format_and_truncate() {
        let pages = vec![page(
            "Roman aqueduct",
            Some("The Romans constructed aqueducts throughout their Republic."),
        )];

        assert_eq!(
            format_pages(&pages, 1000),
            "Page: Roman aqueduct\nSummary: The Romans constructed aqueducts throughout their Republic."
        );
        assert_eq!(format_pages(&pages, 20), "Page: Roman aqueduct");
    }

    #[test]
    fn test_missing_extracts() {
        let pages = vec![page("Nothing", None), page("Blank", Some("  "))];
        assert_eq!(
            format_pages(&pages, 100),
            "No good Wikipedia Search Result was found"
        );
    }

    #[test]
    fn test_decode_extract_response() -> crate::Result<()> {
        let body = r#"{"batchcomplete":true,"query":{"pages":[{"pageid":1,"ns":0,"title":"Aqua Appia","extract":"The Aqua Appia was the first Roman aqueduct."}]}}"#;
        let res: ExtractResponse = serde_json::from_str(body)?;

        assert_eq!(res.query.pages.len(), 1);
        assert_eq!(res.query.pages[0].title, "Aqua Appia");
        Ok(())
    }
}
