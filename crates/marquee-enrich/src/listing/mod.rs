pub mod parser;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use marquee_core::config::{HttpConfig, ListingConfig};
use marquee_core::MovieCatalog;

use crate::error::{EnrichError, Result};
use crate::http::ApiClient;

pub use parser::{ListingFilter, ListingItem, build_catalog, parse_listing};

const QUERY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Where the repertoire page comes from.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_html(&self) -> Result<String>;

    fn describe(&self) -> String;
}

/// Live repertoire page of one cinema.
pub struct HttpListing {
    client: ApiClient,
    url: String,
    window_days: u32,
    html_dump: Option<PathBuf>,
}

impl HttpListing {
    pub fn new(config: &ListingConfig, http: &HttpConfig) -> Result<Self> {
        let client = ApiClient::new(
            std::time::Duration::from_secs(http.timeout_secs),
            &http.user_agent,
        )?;
        Ok(Self {
            client,
            url: config.url.clone(),
            window_days: config.window_days,
            html_dump: config.html_dump.as_ref().map(PathBuf::from),
        })
    }

    /// Listing URL for the window starting at `today`.
    pub fn url_for(&self, today: NaiveDate) -> String {
        listing_url(&self.url, today, self.window_days)
    }

    async fn dump(&self, html: &str) {
        let Some(path) = &self.html_dump else {
            return;
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            tracing::warn!("cannot create {}: {e}", parent.display());
            return;
        }
        match tokio::fs::write(path, html).await {
            Ok(()) => tracing::debug!("listing page saved to {}", path.display()),
            Err(e) => tracing::warn!("cannot save listing page to {}: {e}", path.display()),
        }
    }
}

/// `{base}?data=<today>,<last day>` where the range spans `window_days` days.
pub fn listing_url(base: &str, today: NaiveDate, window_days: u32) -> String {
    let span = u64::from(window_days.saturating_sub(1));
    let last = today.checked_add_days(Days::new(span)).unwrap_or(today);
    format!(
        "{base}?data={},{}",
        today.format(QUERY_DATE_FORMAT),
        last.format(QUERY_DATE_FORMAT)
    )
}

#[async_trait]
impl ListingSource for HttpListing {
    async fn fetch_html(&self) -> Result<String> {
        let url = self.url_for(Local::now().date_naive());
        tracing::info!("Fetching listing from {url}");
        let html = self
            .client
            .get(&url)
            .await
            .map_err(|e| EnrichError::Listing(format!("{url}: {e}")))?;
        self.dump(&html).await;
        Ok(html)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A repertoire page saved to disk.
pub struct FileListing {
    path: PathBuf,
}

impl FileListing {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ListingSource for FileListing {
    async fn fetch_html(&self) -> Result<String> {
        tracing::info!("Reading listing from {}", self.path.display());
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| EnrichError::Listing(format!("{}: {e}", self.path.display())))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fetch, parse and filter the listing into a fresh catalog.
pub async fn scrape(source: &dyn ListingSource, config: &ListingConfig) -> Result<MovieCatalog> {
    let html = source.fetch_html().await?;
    let filter = ListingFilter {
        window_days: config.window_days,
        denylist: config.denylist.clone(),
    };
    let items = parse_listing(&html);
    tracing::debug!("{} entries on the page from {}", items.len(), source.describe());
    Ok(build_catalog(items, &filter, Local::now().date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tempfile::TempDir;

    const PAGE: &str = r#"<html><body>
        <div class="filmlist__info--inverted">
            <span rv-text="item.title">Kler</span>
            <span rv-text="item.rank_value">6,9</span>
            <span rv-text="item.info_release">01.01.2000</span>
        </div>
    </body></html>"#;

    #[test]
    fn test_listing_url_range() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        assert_eq!(
            listing_url("https://multikino.pl/repertuar/gdansk", today, 7),
            "https://multikino.pl/repertuar/gdansk?data=27-02-2024,04-03-2024"
        );
        assert_eq!(listing_url("http://x", today, 0), "http://x?data=27-02-2024,27-02-2024");
    }

    #[tokio::test]
    async fn test_http_listing_fetches_and_dumps() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", Matcher::Regex("^/repertuar/gdansk".to_string()))
            .match_query(Matcher::Regex("data=".to_string()))
            .with_status(200)
            .with_body(PAGE)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("dump").join("listing.html");
        let config = ListingConfig {
            url: format!("{}/repertuar/gdansk", server.url()),
            html_dump: Some(dump.to_string_lossy().into_owned()),
            ..ListingConfig::default()
        };
        let listing = HttpListing::new(&config, &HttpConfig::default()).unwrap();

        let catalog = scrape(&listing, &config).await.unwrap();
        assert_eq!(catalog.titles().collect::<Vec<_>>(), vec!["Kler"]);
        assert_eq!(std::fs::read_to_string(&dump).unwrap(), PAGE);
    }

    #[tokio::test]
    async fn test_http_listing_error_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", Matcher::Regex("^/repertuar".to_string()))
            .with_status(500)
            .create_async()
            .await;

        let config = ListingConfig {
            url: format!("{}/repertuar", server.url()),
            ..ListingConfig::default()
        };
        let listing = HttpListing::new(&config, &HttpConfig::default()).unwrap();
        let err = listing.fetch_html().await.unwrap_err();
        assert!(matches!(err, EnrichError::Listing(_)));
    }

    #[tokio::test]
    async fn test_file_listing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, PAGE).unwrap();

        let catalog = scrape(&FileListing::new(&path), &ListingConfig::default())
            .await
            .unwrap();
        let record = catalog.get("Kler").unwrap();
        assert!(record.released);
        assert_eq!(record.rating.mul(), 6.9);
    }

    #[tokio::test]
    async fn test_file_listing_missing() {
        let err = FileListing::new("/definitely/not/here.html")
            .fetch_html()
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::Listing(_)));
    }
}
