use std::time::Duration;

use async_trait::async_trait;
use marquee_core::MovieRecord;
use marquee_core::config::{FilmwebConfig, HttpConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enrichment::merge::MergeEnrichment;
use crate::error::{EnrichError, Result};
use crate::http::ApiClient;
use crate::sources::EnrichmentSource;

const SOURCE: &str = "filmweb";
const ID_DELIMITER: &str = "\\c";
const INFO_METHOD: &str = "getFilmInfoFull";

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" t:\d+").expect("valid regex"));

/// Positions of the fields we use in the `getFilmInfoFull` array.
mod position {
    pub const TITLE_ENG: usize = 1;
    pub const RATING: usize = 2;
    pub const YEAR: usize = 5;
    pub const FORUM_URL: usize = 8;
    pub const POSTER: usize = 11;
}

/// Decoded `getFilmInfoFull` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilmInfo {
    pub title_eng: Option<String>,
    pub rating: Option<f64>,
    pub year: Option<i32>,
    pub forum_url: Option<String>,
    pub poster_path: Option<String>,
}

impl FilmInfo {
    pub fn from_json(v: &Value) -> Result<Self> {
        let items = v
            .as_array()
            .ok_or_else(|| shape_error(format!("expected an array, got {}", kind_of(v))))?;

        Ok(Self {
            title_eng: text_at(items, position::TITLE_ENG, "title_eng")?,
            rating: rating_at(items, position::RATING)?,
            year: year_at(items, position::YEAR)?,
            forum_url: text_at(items, position::FORUM_URL, "forum_url")?,
            poster_path: text_at(items, position::POSTER, "poster_path")?,
        })
    }
}

fn shape_error(detail: impl Into<String>) -> EnrichError {
    EnrichError::UnexpectedShape(SOURCE.to_string(), detail.into())
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn present(items: &[Value], idx: usize) -> Option<&Value> {
    items.get(idx).filter(|v| !v.is_null())
}

fn text_at(items: &[Value], idx: usize, field: &str) -> Result<Option<String>> {
    match present(items, idx) {
        None => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(other) => Err(shape_error(format!(
            "{field} at position {idx} is a {}",
            kind_of(other)
        ))),
    }
}

fn rating_at(items: &[Value], idx: usize) -> Result<Option<f64>> {
    match present(items, idx) {
        None => Ok(None),
        Some(v @ (Value::Number(_) | Value::String(_))) => Ok(Some(marquee_core::normalize(v))),
        Some(other) => Err(shape_error(format!(
            "rating at position {idx} is a {}",
            kind_of(other)
        ))),
    }
}

fn year_at(items: &[Value], idx: usize) -> Result<Option<i32>> {
    match present(items, idx) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_i64().and_then(|y| i32::try_from(y).ok())),
        Some(Value::String(s)) => Ok(s.trim().parse().ok()),
        Some(other) => Err(shape_error(format!(
            "year at position {idx} is a {}",
            kind_of(other)
        ))),
    }
}

/// Filmweb accepts spaces as `%20` and nothing else escaped.
pub fn encode_title(title: &str) -> String {
    title.replace(' ', "%20")
}

/// MD5 signature of a mobile API method call.
///
/// The separator between method and app id is a literal backslash followed
/// by `n`, not a newline.
pub fn signature(method: &str, app_id: &str, secret: &str) -> String {
    format!("{:x}", md5::compute(format!("{method}\\n{app_id}{secret}")))
}

/// Pull the film id out of a live-search response.
pub fn extract_film_id(body: &str) -> Option<&str> {
    body.split(ID_DELIMITER)
        .nth(1)
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Decode the body of an API call: status line, then data line with a
/// trailing ` t:<timestamp>` token.
pub fn parse_film_info(body: &str) -> Result<FilmInfo> {
    let line = body
        .lines()
        .nth(1)
        .ok_or_else(|| shape_error("response has no data line"))?;
    let cleaned = TIMESTAMP_RE.replace_all(line, "");
    let value: Value = serde_json::from_str(cleaned.trim())
        .map_err(|e| shape_error(format!("data line is not JSON: {e}")))?;
    FilmInfo::from_json(&value)
}

pub struct FilmwebSource {
    client: ApiClient,
    search_url: String,
    api_url: String,
    poster_base_url: String,
    app_id: String,
    secret: String,
}

impl FilmwebSource {
    pub fn new(config: &FilmwebConfig, http: &HttpConfig) -> Result<Self> {
        let client = ApiClient::new(Duration::from_secs(http.timeout_secs), &http.user_agent)?;
        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            api_url: config.api_url.clone(),
            poster_base_url: config.poster_base_url.clone(),
            app_id: config.app_id.clone(),
            secret: config.secret.clone(),
        })
    }

    /// Point both endpoints at one server; used against mock servers.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let config = FilmwebConfig {
            search_url: format!("{base_url}/search/live"),
            api_url: format!("{base_url}/api"),
            ..FilmwebConfig::default()
        };
        Self::new(&config, &HttpConfig::default())
    }

    pub async fn resolve_id(&self, title: &str) -> Result<String> {
        let url = format!("{}?q={}", self.search_url, encode_title(title));
        let body = self.client.get(&url).await?;
        extract_film_id(&body)
            .map(ToOwned::to_owned)
            .ok_or_else(|| EnrichError::NoMatch(title.to_string()))
    }

    pub async fn fetch_film_info(&self, id: &str) -> Result<FilmInfo> {
        let method = format!("{INFO_METHOD} [{id}]");
        let sig = signature(&method, &self.app_id, &self.secret);
        let url = format!(
            "{}?version=1.0&appId={}&methods={INFO_METHOD}%20[{id}]%5Cn&signature=1.0,{sig}",
            self.api_url, self.app_id
        );
        let body = self.client.get(&url).await?;
        parse_film_info(&body)
    }

    /// Both steps for one title. They cannot overlap: the second needs the id.
    pub async fn lookup_title(&self, title: &str) -> Result<FilmInfo> {
        let id = self.resolve_id(title).await?;
        tracing::debug!("filmweb id for {title:?}: {id}");
        self.fetch_film_info(&id).await
    }
}

#[async_trait]
impl EnrichmentSource for FilmwebSource {
    type Found = FilmInfo;

    fn name(&self) -> &'static str {
        "Filmweb"
    }

    async fn lookup(&self, record: &MovieRecord) -> Result<Option<FilmInfo>> {
        self.lookup_title(&record.title).await.map(Some)
    }

    fn apply(&self, record: &mut MovieRecord, found: FilmInfo) -> Vec<&'static str> {
        record.merge_filmweb(found, &self.poster_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const INFO_BODY: &str = "ok\n[\"Diuna: Część druga\",\"Dune: Part Two\",\"8,1\",null,null,2024,166,null,\"https://www.filmweb.pl/film/Diuna-2024-1234/discussion\",null,null,\"/12/34/1234/8116711.2.jpg\"] t:1712345678\n";

    #[test]
    fn test_encode_title_only_spaces() {
        assert_eq!(encode_title("Dune Part Two"), "Dune%20Part%20Two");
        assert_eq!(encode_title("Kler&Co"), "Kler&Co");
    }

    #[test]
    fn test_signature_is_md5_of_method_call() {
        let expected = format!(
            "{:x}",
            md5::compute("getFilmInfoFull [1234]\\nandroidsecret".as_bytes())
        );
        assert_eq!(signature("getFilmInfoFull [1234]", "android", "secret"), expected);
        assert_eq!(expected.len(), 32);
    }

    #[test]
    fn test_extract_film_id() {
        assert_eq!(extract_film_id("f\\c1234\\cDiuna\\c2021"), Some("1234"));
        assert_eq!(extract_film_id(""), None);
        assert_eq!(extract_film_id("no delimiter here"), None);
        assert_eq!(extract_film_id("f\\cabc\\c"), None);
    }

    #[test]
    fn test_parse_film_info_strips_timestamp() {
        let info = parse_film_info(INFO_BODY).unwrap();
        assert_eq!(info.title_eng.as_deref(), Some("Dune: Part Two"));
        assert_eq!(info.rating, Some(8.1));
        assert_eq!(info.year, Some(2024));
        assert_eq!(
            info.forum_url.as_deref(),
            Some("https://www.filmweb.pl/film/Diuna-2024-1234/discussion")
        );
        assert_eq!(info.poster_path.as_deref(), Some("/12/34/1234/8116711.2.jpg"));
    }

    #[test]
    fn test_short_array_yields_absent_fields() {
        let info = FilmInfo::from_json(&json!(["Tytuł", "Title", 6.5])).unwrap();
        assert_eq!(info.title_eng.as_deref(), Some("Title"));
        assert_eq!(info.rating, Some(6.5));
        assert!(info.year.is_none());
        assert!(info.poster_path.is_none());
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(matches!(
            parse_film_info("err"),
            Err(EnrichError::UnexpectedShape(..))
        ));
        assert!(matches!(
            parse_film_info("ok\nnot json"),
            Err(EnrichError::UnexpectedShape(..))
        ));
        assert!(matches!(
            FilmInfo::from_json(&json!({"title": "x"})),
            Err(EnrichError::UnexpectedShape(..))
        ));
        assert!(matches!(
            FilmInfo::from_json(&json!([null, {"nested": true}])),
            Err(EnrichError::UnexpectedShape(..))
        ));
    }

    #[tokio::test]
    async fn test_lookup_title_two_steps() {
        let mut server = Server::new_async().await;
        let base_url = server.url();

        let search = server
            .mock("GET", Matcher::Regex(r"^/search/live".to_string()))
            .match_query(Matcher::UrlEncoded(
                "q".to_string(),
                "Dune Part Two".to_string(),
            ))
            .with_status(200)
            .with_body("f\\c1234\\cDiuna: Część druga\\c2024")
            .create_async()
            .await;

        let sig = signature("getFilmInfoFull [1234]", "android", &FilmwebConfig::default().secret);
        let info = server
            .mock("GET", Matcher::Regex(r"^/api".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("1234".to_string()),
                Matcher::Regex(format!("signature=1.0,{sig}")),
            ]))
            .with_status(200)
            .with_body(INFO_BODY)
            .create_async()
            .await;

        let source = FilmwebSource::with_base_url(&base_url).unwrap();
        let result = source.lookup_title("Dune Part Two").await.unwrap();

        search.assert_async().await;
        info.assert_async().await;
        assert_eq!(result.year, Some(2024));
        assert_eq!(result.rating, Some(8.1));
    }

    #[tokio::test]
    async fn test_unknown_title_is_no_match() {
        let mut server = Server::new_async().await;
        let base_url = server.url();

        let _search = server
            .mock("GET", Matcher::Regex(r"^/search/live".to_string()))
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let source = FilmwebSource::with_base_url(&base_url).unwrap();
        let err = source.lookup_title("Nonexistent").await.unwrap_err();
        assert!(matches!(err, EnrichError::NoMatch(t) if t == "Nonexistent"));
    }
}
