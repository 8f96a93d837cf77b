//! Page-loading strategies tried by `ContentExtractor`, in priority order.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::html::{self, FALLBACK_STRIP_TAGS};

/// Timeout for the raw-HTML fallback fetch.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the other HTTP loaders and the headless browser.
pub const LOADER_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("browser exited with {status}: {stderr}")]
    Browser { status: String, stderr: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches the raw HTML of a page.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, StrategyError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, StrategyError> {
        Self::build(timeout, false)
    }

    /// A fetcher that accepts invalid TLS certificates.
    pub fn insecure(timeout: Duration) -> Result<Self, StrategyError> {
        Self::build(timeout, true)
    }

    fn build(timeout: Duration, accept_invalid_certs: bool) -> Result<Self, StrategyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HtmlFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, StrategyError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StrategyError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// One way of turning a URL into page text.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Loads `url` and returns its text with `selectors` removed.
    /// The text is not yet cleaned line by line.
    async fn try_extract(&self, url: &str, selectors: &[&str]) -> Result<String, StrategyError>;
}

// ── Rendered page ───────────────────────────────────────────────────────────

/// Renders the page in a headless Chromium and reads the resulting DOM, so
/// client-side rendered postings come through.
pub struct RenderedPageLoader {
    browser_bin: String,
    timeout: Duration,
}

impl RenderedPageLoader {
    pub fn new(browser_bin: impl Into<String>) -> Self {
        Self {
            browser_bin: browser_bin.into(),
            timeout: LOADER_TIMEOUT,
        }
    }
}

#[async_trait]
impl ExtractionStrategy for RenderedPageLoader {
    fn name(&self) -> &'static str {
        "rendered_page"
    }

    async fn try_extract(&self, url: &str, selectors: &[&str]) -> Result<String, StrategyError> {
        let run = Command::new(&self.browser_bin)
            .args(["--headless", "--disable-gpu", "--no-sandbox", "--dump-dom", url])
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| StrategyError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(StrategyError::Browser {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let dom = String::from_utf8_lossy(&output.stdout);
        debug!("{} dumped {} bytes of DOM", self.browser_bin, dom.len());
        Ok(html::visible_text(&dom, selectors))
    }
}

// ── Unstructured content ────────────────────────────────────────────────────

/// Plain HTTP load with TLS verification off, boilerplate selectors removed.
pub struct UnstructuredLoader {
    fetcher: Box<dyn HtmlFetcher>,
}

impl UnstructuredLoader {
    pub fn new() -> Result<Self, StrategyError> {
        Ok(Self::with_fetcher(Box::new(HttpFetcher::insecure(
            LOADER_TIMEOUT,
        )?)))
    }

    pub fn with_fetcher(fetcher: Box<dyn HtmlFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for UnstructuredLoader {
    fn name(&self) -> &'static str {
        "unstructured"
    }

    async fn try_extract(&self, url: &str, selectors: &[&str]) -> Result<String, StrategyError> {
        let page = self.fetcher.fetch(url).await?;
        Ok(html::visible_text(&page, selectors))
    }
}

// ── Web base ────────────────────────────────────────────────────────────────

/// Simplest loader: fetch and take all visible text, no selector removal.
pub struct WebBaseLoader {
    fetcher: Box<dyn HtmlFetcher>,
}

impl WebBaseLoader {
    pub fn new() -> Result<Self, StrategyError> {
        Ok(Self::with_fetcher(Box::new(HttpFetcher::new(LOADER_TIMEOUT)?)))
    }

    pub fn with_fetcher(fetcher: Box<dyn HtmlFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for WebBaseLoader {
    fn name(&self) -> &'static str {
        "web_base"
    }

    async fn try_extract(&self, url: &str, _selectors: &[&str]) -> Result<String, StrategyError> {
        let page = self.fetcher.fetch(url).await?;
        Ok(html::visible_text(&page, &[]))
    }
}

// ── Raw HTML fallback ───────────────────────────────────────────────────────

/// Last resort: GET with a short timeout, drop script/style/header/footer/nav
/// and keep the remaining body text.
pub struct RawHtmlFallback {
    fetcher: Box<dyn HtmlFetcher>,
}

impl RawHtmlFallback {
    pub fn new() -> Result<Self, StrategyError> {
        Ok(Self::with_fetcher(Box::new(HttpFetcher::new(
            FALLBACK_TIMEOUT,
        )?)))
    }

    pub fn with_fetcher(fetcher: Box<dyn HtmlFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for RawHtmlFallback {
    fn name(&self) -> &'static str {
        "raw_html"
    }

    async fn try_extract(&self, url: &str, _selectors: &[&str]) -> Result<String, StrategyError> {
        let page = self.fetcher.fetch(url).await?;
        Ok(html::visible_text(&page, FALLBACK_STRIP_TAGS))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Serves a fixed page, or a fixed HTTP status.
    pub(crate) struct StaticFetcher(pub Result<&'static str, u16>);

    #[async_trait]
    impl HtmlFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, StrategyError> {
            match self.0 {
                Ok(body) => Ok(body.to_string()),
                Err(status) => Err(StrategyError::Status(status)),
            }
        }
    }

    const PAGE: &str = r#"<html><body>
        <header>Site header</header>
        <div class="cookie-consent">We use cookies</div>
        <main><h1>Rust Engineer</h1><p>Build services.</p></main>
        <footer>Footer</footer>
    </body></html>"#;

    #[tokio::test]
    async fn test_unstructured_removes_selectors() {
        let loader = UnstructuredLoader::with_fetcher(Box::new(StaticFetcher(Ok(PAGE))));
        let text = loader
            .try_extract("https://example.com", &["header", "footer", ".cookie-consent"])
            .await
            .unwrap();
        assert_eq!(text, "Rust Engineer\nBuild services.");
    }

    #[tokio::test]
    async fn test_web_base_keeps_everything_visible() {
        let loader = WebBaseLoader::with_fetcher(Box::new(StaticFetcher(Ok(PAGE))));
        let text = loader
            .try_extract("https://example.com", &["header"])
            .await
            .unwrap();
        assert!(text.starts_with("Site header"));
        assert!(text.contains("We use cookies"));
    }

    #[tokio::test]
    async fn test_raw_fallback_ignores_selectors_and_strips_chrome() {
        let fallback = RawHtmlFallback::with_fetcher(Box::new(StaticFetcher(Ok(PAGE))));
        let text = fallback.try_extract("https://example.com", &[]).await.unwrap();
        assert_eq!(text, "We use cookies\nRust Engineer\nBuild services.");
    }

    #[tokio::test]
    async fn test_fetch_status_error_propagates() {
        let fallback = RawHtmlFallback::with_fetcher(Box::new(StaticFetcher(Err(503))));
        let err = fallback.try_extract("https://example.com", &[]).await.unwrap_err();
        assert!(matches!(err, StrategyError::Status(503)));
    }

    #[tokio::test]
    async fn test_rendered_loader_reports_missing_browser() {
        let loader = RenderedPageLoader::new("/nonexistent/chromium-binary");
        let err = loader.try_extract("https://example.com", &[]).await.unwrap_err();
        assert!(matches!(err, StrategyError::Io(_)));
    }
}
