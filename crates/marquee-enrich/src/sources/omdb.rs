use std::time::Duration;

use async_trait::async_trait;
use marquee_core::config::{HttpConfig, OmdbConfig};
use marquee_core::{MovieRecord, normalize};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enrichment::merge::MergeEnrichment;
use crate::error::{EnrichError, Result};
use crate::http::ApiClient;
use crate::sources::EnrichmentSource;

const SOURCE: &str = "omdb";
const NOT_AVAILABLE: &str = "N/A";
const SIZE_MARKER: &str = "._V1_";
/// Errors OMDb reports for a query that simply has no good answer.
const NO_MATCH_ERRORS: [&str; 2] = ["Movie not found!", "Too many results."];

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<SearchHit>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DetailsResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "imdbRating")]
    rating: Option<Value>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<RuntimeField>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

/// Runtime arrives either as one value or as a short list of values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RuntimeField {
    Many(Vec<Value>),
    One(Value),
}

impl RuntimeField {
    fn minutes(&self) -> u32 {
        let first = match self {
            Self::Many(values) => values.first(),
            Self::One(value) => Some(value),
        };
        first.map(minutes_of).unwrap_or(0)
    }
}

fn minutes_of(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()).unwrap_or(0),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// What one OMDb details call tells us about a movie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OmdbMovie {
    pub imdb_id: String,
    pub rating: Option<f64>,
    pub cover_url: Option<String>,
    pub full_cover_url: Option<String>,
    /// Minutes; `0` when unknown.
    pub runtime: u32,
}

impl OmdbMovie {
    fn from_details(imdb_id: &str, details: DetailsResponse) -> Self {
        let rating = details
            .rating
            .filter(|v| v.as_str() != Some(NOT_AVAILABLE) && !v.is_null())
            .map(|v| normalize(&v));
        let cover_url = details
            .poster
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && p != NOT_AVAILABLE);
        let full_cover_url = cover_url.as_deref().and_then(full_size_url);
        let runtime = details.runtime.as_ref().map(RuntimeField::minutes).unwrap_or(0);

        Self {
            imdb_id: imdb_id.to_string(),
            rating,
            cover_url,
            full_cover_url,
            runtime,
        }
    }
}

/// Drop the size modifier from an IMDb image URL:
/// `...@._V1_SX300.jpg` becomes `...@._V1_.jpg`.
pub fn full_size_url(cover: &str) -> Option<String> {
    let start = cover.rfind(SIZE_MARKER)? + SIZE_MARKER.len();
    let ext_at = start + cover[start..].rfind('.')?;
    let full = format!("{}{}", &cover[..start], &cover[ext_at..]);
    (full != cover).then_some(full)
}

/// Titles to search for: the listed title, then the English title from an
/// earlier pass when the listed one finds nothing.
pub fn query_titles(record: &MovieRecord) -> Vec<&str> {
    let mut titles = vec![record.title.as_str()];
    if let Some(eng) = record.title_eng.as_deref().map(str::trim)
        && !eng.is_empty()
        && eng != record.title
    {
        titles.push(eng);
    }
    titles
}

pub struct OmdbSource {
    client: ApiClient,
    base_url: String,
    api_key: String,
}

impl OmdbSource {
    pub fn new(config: &OmdbConfig, http: &HttpConfig, api_key: String) -> Result<Self> {
        let client = ApiClient::new(Duration::from_secs(http.timeout_secs), &http.user_agent)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let config = OmdbConfig {
            base_url: base_url.to_string(),
            ..OmdbConfig::default()
        };
        Self::new(&config, &HttpConfig::default(), api_key.to_string())
    }

    /// First search hit for a free-text title, if any.
    pub async fn search(&self, title: &str) -> Result<Option<SearchHit>> {
        let url = format!(
            "{}/?s={}&type=movie&apikey={}",
            self.base_url,
            urlencoding::encode(title),
            urlencoding::encode(&self.api_key)
        );
        let resp: SearchResponse = self.client.get_json(&url).await?;

        if resp.response != "True" {
            return match resp.error {
                Some(err) if !NO_MATCH_ERRORS.contains(&err.as_str()) => {
                    Err(EnrichError::ApiError(SOURCE.to_string(), err))
                }
                _ => Ok(None),
            };
        }
        Ok(resp.search.into_iter().next())
    }

    pub async fn fetch_details(&self, imdb_id: &str) -> Result<OmdbMovie> {
        let url = format!(
            "{}/?i={}&plot=short&apikey={}",
            self.base_url,
            urlencoding::encode(imdb_id),
            urlencoding::encode(&self.api_key)
        );
        let details: DetailsResponse = self.client.get_json(&url).await?;
        if details.response != "True" {
            let err = details
                .error
                .unwrap_or_else(|| format!("no details for {imdb_id}"));
            return Err(EnrichError::ApiError(SOURCE.to_string(), err));
        }
        Ok(OmdbMovie::from_details(imdb_id, details))
    }
}

#[async_trait]
impl EnrichmentSource for OmdbSource {
    type Found = OmdbMovie;

    fn name(&self) -> &'static str {
        "OMDb"
    }

    async fn lookup(&self, record: &MovieRecord) -> Result<Option<OmdbMovie>> {
        for query in query_titles(record) {
            if let Some(hit) = self.search(query).await? {
                tracing::debug!("omdb match for {:?}: {} ({})", record.title, hit.title, hit.imdb_id);
                return self.fetch_details(&hit.imdb_id).await.map(Some);
            }
        }
        Ok(None)
    }

    fn apply(&self, record: &mut MovieRecord, found: OmdbMovie) -> Vec<&'static str> {
        record.merge_omdb(found)
    }
}
