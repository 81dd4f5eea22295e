use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures_util::StreamExt;
use scraper::Html;

use crate::models::{FetchOptions, PageRequest};

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = concat!("pagegrab/", env!("CARGO_PKG_VERSION"));
const INSECURE_SSL_ENV: &str = "PAGEGRAB_INSECURE_SSL";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL {0}")]
    InvalidUrl(String),
    #[error("could not connect: {0}")]
    Request(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("browser: {0}")]
    Browser(String),
}

// ── HTTP client ──────────────────────────────────────────────────────────────

/// Client shared by the direct fetch and the image downloads.
pub fn build_client() -> Result<reqwest::Client, FetchError> {
    let insecure = std::env::var(INSECURE_SSL_ENV).as_deref() == Ok("1");

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/*;q=0.8,*/*;q=0.5",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
    );

    let mut builder = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .default_headers(headers);

    if insecure {
        tracing::warn!("{} set, accepting invalid certificates", INSECURE_SSL_ENV);
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))
}

// ── Strategies ───────────────────────────────────────────────────────────────

/// How the page markup is obtained.
pub enum Fetcher {
    /// One GET request, no script execution.
    Direct(reqwest::Client),
    /// Drive a Chromium instance and capture the DOM after the load event.
    Rendered(FetchOptions),
}

impl Fetcher {
    pub fn for_request(request: &PageRequest, client: &reqwest::Client) -> Self {
        if request.render {
            Fetcher::Rendered(request.options)
        } else {
            Fetcher::Direct(client.clone())
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<Html, FetchError> {
        let markup = match self {
            Fetcher::Direct(client) => fetch_direct(client, url).await?,
            Fetcher::Rendered(options) => fetch_rendered(url, *options).await?,
        };
        Ok(Html::parse_document(&markup))
    }
}

async fn fetch_direct(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    tracing::info!(url, "downloading page");
    let parsed =
        url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

    let response = client.get(parsed).send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Request(format!("timed out: {}", e))
        } else if e.is_connect() {
            FetchError::Request(format!("connect failed: {}", e))
        } else {
            FetchError::Request(e.to_string())
        }
    })?;

    let status = response.status();
    if !(status.is_success() || status.is_redirection()) {
        return Err(FetchError::Status(status.as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))
}

async fn fetch_rendered(url: &str, options: FetchOptions) -> Result<String, FetchError> {
    tracing::info!(
        url,
        headless = options.headless,
        incognito = options.incognito,
        "downloading page with browser"
    );

    let mut builder = BrowserConfig::builder();
    if !options.headless {
        builder = builder.with_head();
    }
    if options.incognito {
        builder = builder.arg("--incognito");
    }
    let config = builder
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-dev-shm-usage")
        .build()
        .map_err(FetchError::Browser)?;

    let (mut browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| FetchError::Browser(format!("launch failed: {}", e)))?;

    let pump = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("browser handler error: {}", e);
            }
        }
    });

    let result = capture_page(&browser, url).await;

    // The browser process goes down on every path out of here.
    if let Err(e) = browser.close().await {
        tracing::warn!("failed to close browser: {}", e);
    }
    if let Err(e) = browser.wait().await {
        tracing::warn!("failed to reap browser process: {}", e);
    }
    pump.abort();

    result
}

async fn capture_page(browser: &Browser, url: &str) -> Result<String, FetchError> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| FetchError::Browser(format!("navigation to {} failed: {}", url, e)))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| FetchError::Browser(format!("page load failed: {}", e)))?;
    page.content()
        .await
        .map_err(|e| FetchError::Browser(format!("could not read page source: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(render: bool) -> PageRequest {
        PageRequest {
            website: "https://example.com".to_string(),
            render,
            options: FetchOptions {
                headless: true,
                incognito: false,
            },
        }
    }

    #[test]
    fn strategy_follows_render_flag() {
        let client = build_client().unwrap();
        assert!(matches!(Fetcher::for_request(&request(false), &client), Fetcher::Direct(_)));
        match Fetcher::for_request(&request(true), &client) {
            Fetcher::Rendered(options) => assert!(options.headless),
            Fetcher::Direct(_) => panic!("expected rendered fetcher"),
        }
    }

    #[tokio::test]
    async fn direct_fetch_parses_page_and_maps_status() {
        use crate::test_support::{local_client, serve, Route};

        let base = serve(vec![Route::ok(
            "/page.html",
            "text/html",
            b"<html><head><title>Hello</title></head><body><img src=\"/a.png\"></body></html>",
        )])
        .await;
        let fetcher = Fetcher::Direct(local_client());

        let page = match fetcher.fetch(&format!("{}/page.html", base)).await {
            Ok(page) => page,
            Err(e) => panic!("fetch failed: {}", e),
        };
        let title = scraper::Selector::parse("title").unwrap();
        let text: String = page.select(&title).flat_map(|el| el.text()).collect();
        assert_eq!(text, "Hello");

        let missing = fetcher.fetch(&format!("{}/nope", base)).await;
        assert!(matches!(missing, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn direct_fetch_rejects_unparseable_url() {
        let client = build_client().unwrap();
        let result = Fetcher::Direct(client).fetch("https://").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
