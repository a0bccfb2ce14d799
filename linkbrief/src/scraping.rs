use anyhow::{Context, Result};
use common::FetchConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{Html, Selector};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Source of readable article text.
#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    /// Main text of the article at `url`, or `None` when nothing usable could be retrieved.
    /// Never fails: network and parsing errors are logged and collapse into `None`.
    async fn fetch_article(&self, url: &str) -> Option<String>;
}

/// Fetches articles over HTTP and strips page furniture.
pub struct WebArticleFetcher {
    client: Client,
}

impl WebArticleFetcher {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Self::new(config.timeout_seconds, &config.user_agent)
    }

    /// Scrapes the content of an article from the given URL.
    /// Returns the extracted text content, empty when extraction found nothing.
    pub async fn scrape_article_content(&self, url: &str) -> Result<String> {
        let url_obj = Url::parse(url).context("failed to parse article URL")?;

        let response = self
            .client
            .get(url_obj.clone())
            .send()
            .await
            .context("failed to fetch article page")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("article fetch failed with status: {}", status));
        }

        let kind = BodyKind::from_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        if kind == BodyKind::Unsupported {
            debug!(%url, "scraping: content type is neither HTML nor plain text, skipping");
            return Ok(String::new());
        }

        // text() decodes using the charset from Content-Type
        let body = response.text().await.context("failed to read response body")?;
        if body.trim().is_empty() {
            return Ok(String::new());
        }

        if kind == BodyKind::PlainText {
            debug!(%url, "scraping: plain text body, skipping HTML extraction");
            return Ok(body.trim().to_string());
        }

        Ok(extract_main_text(&body, &url_obj).unwrap_or_default())
    }
}

/// How a response body is turned into article text, decided by its Content-Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Html,
    PlainText,
    /// Binary or otherwise unreadable media (PDF, images, archives...).
    Unsupported,
}

impl BodyKind {
    /// A missing header is treated as HTML, servers often omit it for pages.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(raw) = content_type else {
            return BodyKind::Html;
        };
        let mime = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "" | "text/html" | "application/xhtml+xml" => BodyKind::Html,
            "text/plain" => BodyKind::PlainText,
            _ => BodyKind::Unsupported,
        }
    }
}

#[async_trait::async_trait]
impl ArticleSource for WebArticleFetcher {
    async fn fetch_article(&self, url: &str) -> Option<String> {
        match self.scrape_article_content(url).await {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => {
                warn!(%url, "scraping: no content extracted");
                None
            }
            Err(e) => {
                warn!(%url, error = %format!("{:#}", e), "scraping: fetch failed");
                None
            }
        }
    }
}

/// Isolate the readable text of an HTML page.
///
/// Tries readability first, then well-known content containers, then every `<p>`.
pub fn extract_main_text(html: &str, url: &Url) -> Option<String> {
    if let Some(text) = readability_text(html, url) {
        info!(%url, chars = text.chars().count(), "scraping: readability extracted content");
        return Some(text);
    }

    let document = Html::parse_document(html);

    let selectors = ["article", "main", ".post-content", ".entry-content", "#content"];
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            if let Some(text) = html_to_text(&element.html()) {
                info!(%url, selector = selector_str, chars = text.chars().count(), "scraping: found content using selector");
                return Some(text);
            }
        }
    }

    if let Ok(p_selector) = Selector::parse("p") {
        let mut full_html = String::new();
        for element in document.select(&p_selector) {
            full_html.push_str(&element.html());
            full_html.push('\n');
        }
        if let Some(text) = html_to_text(&full_html) {
            info!(%url, chars = text.chars().count(), "scraping: fallback to all <p> tags");
            return Some(text);
        }
    }

    warn!(%url, "scraping: could not extract content");
    None
}

fn readability_text(html: &str, url: &Url) -> Option<String> {
    let mut reader = Cursor::new(html.as_bytes());
    match readability::extractor::extract(&mut reader, url) {
        Ok(product) => html_to_text(&product.content).or_else(|| {
            let text = product.text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }),
        Err(e) => {
            debug!(%url, error = %e, "scraping: readability failed");
            None
        }
    }
}

/// Convert an HTML fragment to wrapped plain text; `None` when nothing readable remains.
fn html_to_text(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }
    match html2text::from_read(html.as_bytes(), 80) {
        Ok(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Err(e) => {
            warn!(error = %e, "scraping: failed to convert HTML to text");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Harbour reopens</title></head>
<body>
  <nav><a href="/">Home</a> | <a href="/world">World</a></nav>
  <article>
    <h1>Harbour reopens after storm</h1>
    <p>The city harbour reopened on Monday after a week of repairs following the storm that damaged three of its piers and sank several small boats moored nearby.</p>
    <p>Officials said the fishing fleet would resume normal operations by the end of the month, while the ferry service to the islands restarts tomorrow morning.</p>
    <p>Local businesses welcomed the news, saying the closure had cost them a large share of their usual summer income and forced some to let staff go.</p>
  </article>
  <footer>Copyright Example News</footer>
</body>
</html>"#;

    fn page_url() -> Url {
        Url::parse("https://news.example/harbour").expect("url")
    }

    #[test]
    fn extracts_article_body() {
        let text = extract_main_text(ARTICLE_PAGE, &page_url()).expect("article text");
        assert!(text.contains("harbour reopened on Monday"));
        assert!(text.chars().count() >= 100);
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert_eq!(
            extract_main_text("<html><body></body></html>", &page_url()),
            None
        );
    }

    #[test]
    fn html_to_text_trims_and_rejects_blank() {
        assert_eq!(html_to_text("   "), None);
        assert_eq!(html_to_text("<p>  hello  </p>").as_deref(), Some("hello"));
    }

    #[test]
    fn classifies_content_types() {
        assert_eq!(BodyKind::from_content_type(None), BodyKind::Html);
        assert_eq!(BodyKind::from_content_type(Some("text/html; charset=UTF-8")), BodyKind::Html);
        assert_eq!(BodyKind::from_content_type(Some("application/xhtml+xml")), BodyKind::Html);
        assert_eq!(BodyKind::from_content_type(Some("Text/Plain")), BodyKind::PlainText);
        assert_eq!(BodyKind::from_content_type(Some("application/pdf")), BodyKind::Unsupported);
        assert_eq!(BodyKind::from_content_type(Some("image/png")), BodyKind::Unsupported);
    }
}
