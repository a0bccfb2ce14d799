use linkbrief::scraping::{ArticleSource, WebArticleFetcher};

const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Rail line extended</title></head>
<body>
  <header><a href="/">Front page</a></header>
  <main>
    <article>
      <h1>Rail line extended to the coast</h1>
      <p>The regional rail line will be extended to the coast by next spring, the transport ministry announced on Thursday after years of planning delays.</p>
      <p>The new section adds four stations and is expected to cut travel times between the capital and the coastal towns by almost an hour each way.</p>
      <p>Construction crews have already started clearing the route, and the ministry said the budget had been approved by parliament last month.</p>
    </article>
  </main>
</body>
</html>"#;

fn fetcher() -> WebArticleFetcher {
    WebArticleFetcher::new(5, "LinkBrief-test/0.1").expect("fetcher")
}

#[tokio::test]
async fn test_fetch_extracts_article_text() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/news/rail")
        .match_header("user-agent", "LinkBrief-test/0.1")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(ARTICLE_HTML)
        .create_async()
        .await;

    let url = format!("{}/news/rail", server.url());
    let text = fetcher().fetch_article(&url).await.expect("article text");

    assert!(text.contains("extended to the coast by next spring"));
    assert!(text.chars().count() >= 100);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_plain_text_body_is_used_as_is() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/notes.txt")
        .with_status(200)
        .with_header("content-type", "text/plain; charset=utf-8")
        .with_body("  A plain text article body.  \n")
        .create_async()
        .await;

    let url = format!("{}/notes.txt", server.url());
    let text = fetcher().fetch_article(&url).await;

    assert_eq!(text.as_deref(), Some("A plain text article body."));
}

#[tokio::test]
async fn test_error_status_yields_no_content() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body(ARTICLE_HTML)
        .create_async()
        .await;

    let url = format!("{}/missing", server.url());
    assert_eq!(fetcher().fetch_article(&url).await, None);
}

#[tokio::test]
async fn test_empty_body_yields_no_content() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/empty")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("")
        .create_async()
        .await;

    let url = format!("{}/empty", server.url());
    assert_eq!(fetcher().fetch_article(&url).await, None);
}

#[tokio::test]
async fn test_invalid_url_yields_no_content() {
    assert_eq!(fetcher().fetch_article("https://").await, None);
    assert_eq!(fetcher().fetch_article("not a url").await, None);
}

#[tokio::test]
async fn test_binary_content_type_yields_no_content() {
    let mut server = mockito::Server::new_async().await;

    let mut body = b"%PDF-1.4\n".to_vec();
    body.extend((0..3000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8));
    // Readable markup inside a binary response must not be mistaken for an article
    body.extend_from_slice(ARTICLE_HTML.as_bytes());

    let mock = server
        .mock("GET", "/report.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(body)
        .create_async()
        .await;

    let url = format!("{}/report.pdf", server.url());
    assert_eq!(fetcher().fetch_article(&url).await, None);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_xhtml_content_type_is_extracted() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/news/rail.xhtml")
        .with_status(200)
        .with_header("content-type", "application/xhtml+xml")
        .with_body(ARTICLE_HTML)
        .create_async()
        .await;

    let url = format!("{}/news/rail.xhtml", server.url());
    let text = fetcher().fetch_article(&url).await.expect("article text");
    assert!(text.contains("four stations"));
}
