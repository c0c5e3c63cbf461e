use crate::Result;
use crate::tools::{Tool, ToolDefinition, parse_args};
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

const NAME: &str = "search";
const ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static RESULT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#).expect("valid regex")
});
static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#).expect("valid regex")
});
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Deserialize, JsonSchema)]
struct SearchArgs {
    /// what to search the web for
    query: String,
}

#[derive(Debug, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search backed by the DuckDuckGo html endpoint.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(max_results: usize) -> Result<Box<Self>> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Box::new(Self {
            client,
            max_results,
        }))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let html = self
            .client
            .get(ENDPOINT)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = parse_results(&html, self.max_results);
        tracing::debug!(query, results = results.len(), "web search finished");
        Ok(results)
    }
}

fn clean_text(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, "");
    let text = SPACE_RE.replace_all(&text, " ");
    text.trim()
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Result links are wrapped in a `/l/?uddg=<target>` redirect.
fn resolve_link(href: &str) -> Option<String> {
    let href = href.replace("&amp;", "&");
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href
    };

    let url = reqwest::Url::parse(&absolute).ok()?;
    if let Some((_, target)) = url.query_pairs().find(|(key, _)| key == "uddg") {
        return Some(target.into_owned());
    }

    match url.host_str() {
        Some(host) if host.ends_with("duckduckgo.com") => None,
        _ => Some(url.to_string()),
    }
}

fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let snippets: Vec<String> = SNIPPET_RE
        .captures_iter(html)
        .map(|caps| clean_text(&caps[1]))
        .collect();

    RESULT_LINK_RE
        .captures_iter(html)
        .enumerate()
        .filter_map(|(i, caps)| {
            let href = HREF_RE.captures(&caps[1])?;
            let url = resolve_link(&href[1])?;
            let title = clean_text(&caps[2]);
            if title.is_empty() {
                return None;
            }

            Some(SearchResult {
                title,
                url,
                snippet: snippets.get(i).cloned().unwrap_or_default(),
            })
        })
        .take(max_results)
        .collect()
}

fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No good DuckDuckGo Search Result was found".to_string();
    }

    results
        .iter()
        .map(|r| format!("{}\n{}\n{}", r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for DuckDuckGoSearch {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<SearchArgs>(NAME, "Search the web for information")
    }

    async fn invoke(&mut self, args: &str) -> Result<String> {
        let args: SearchArgs = parse_args(NAME, args)?;
        let results = self.search(&args.query).await?;
        Ok(format_results(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchResult, format_results, parse_results};

    const PAGE: &str = r#"
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FRoman_aqueduct&amp;rut=abc">Roman <b>aqueduct</b> - Wikipedia</a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">The Romans constructed <b>aqueducts</b> throughout their Republic &amp; later Empire.</a>
</div>
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://www.britannica.com/technology/aqueduct-engineering">Aqueduct | Britannica</a>
  </h2>
  <a class="result__snippet" href="https://www.britannica.com/">An aqueduct is a conduit for water.</a>
</div>
"#;

    #[test]
    fn test_parse_results() {
        let results = parse_results(PAGE, 10);

        assert_eq!(
            results,
            vec![
                SearchResult {
                    title: "Roman aqueduct - Wikipedia".to_string(),
                    url: "https://en.wikipedia.org/wiki/Roman_aqueduct".to_string(),
                    snippet: "The Romans constructed aqueducts throughout their Republic & later Empire."
                        .to_string(),
                },
                SearchResult {
                    title: "Aqueduct | Britannica".to_string(),
                    url: "https://www.britannica.com/technology/aqueduct-engineering".to_string(),
                    snippet: "An aqueduct is a conduit for water.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_max_results() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
    }

    #[test]
    fn test_no_results() {
        assert!(parse_results("<html></html>", 5).is_empty());
        assert_eq!(
            format_results(&[]),
            "No good DuckDuckGo Search Result was found"
        );
    }
}
