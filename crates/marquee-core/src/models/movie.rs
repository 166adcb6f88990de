use serde::{Deserialize, Serialize};

use super::rating::Rating;

/// Sentinel shown when the listing carries no genres.
pub const NO_GENRES: &str = "-";

const DISCUSSION_SUFFIX: &str = "/discussion";

/// One movie from the cinema listing, plus whatever the film services added.
///
/// `title` is the join key for both enrichment passes and is never rewritten
/// after the listing scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_eng: Option<String>,
    #[serde(default)]
    pub votes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_genres")]
    pub genres: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Full-size cover from the movie database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_full: Option<String>,
    /// Regular cover from the movie database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_primary: Option<String>,
    /// Poster from Filmweb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub released: bool,
}

fn default_genres() -> String {
    NO_GENRES.to_string()
}

impl MovieRecord {
    /// Create a bare record with only its title set.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            title_eng: None,
            votes: String::new(),
            date: None,
            description: String::new(),
            genres: default_genres(),
            year: None,
            rating: Rating::default(),
            url: None,
            poster_full: None,
            poster_primary: None,
            poster_secondary: None,
            runtime: None,
            released: false,
        }
    }

    /// The value records are ranked by.
    pub fn sort_rating(&self) -> f64 {
        self.rating.imdb()
    }

    /// Join genre names with `", "`, falling back to [`NO_GENRES`].
    pub fn set_genres<I, S>(&mut self, genres: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = genres
            .into_iter()
            .map(|g| g.as_ref().trim().to_string())
            .filter(|g| !g.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        self.genres = if joined.is_empty() {
            default_genres()
        } else {
            joined
        };
    }

    /// Poster to display: full-size, then regular cover, then Filmweb.
    pub fn display_poster(&self) -> Option<&str> {
        self.poster_full
            .as_deref()
            .or(self.poster_primary.as_deref())
            .or(self.poster_secondary.as_deref())
    }

    /// Human-readable runtime: `"2 hr 5 min."` or `"45 min."`.
    pub fn pretty_runtime(&self) -> Option<String> {
        self.runtime.map(format_runtime)
    }
}

/// Format minutes as `"<H> hr <M> min."`, or `"<M> min."` under an hour.
pub fn format_runtime(minutes: u32) -> String {
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours} hr {minutes} min.")
    } else {
        format!("{minutes} min.")
    }
}

/// Strip a trailing `/discussion` from a Filmweb forum link.
pub fn trim_forum_url(url: &str) -> &str {
    url.strip_suffix(DISCUSSION_SUFFIX).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = MovieRecord::new("Diuna");
        assert_eq!(record.title, "Diuna");
        assert_eq!(record.genres, NO_GENRES);
        assert_eq!(record.rating, Rating::default());
        assert!(record.display_poster().is_none());
        assert!(record.pretty_runtime().is_none());
    }

    #[test]
    fn test_trim_forum_url() {
        assert_eq!(trim_forum_url("https://x/123/discussion"), "https://x/123");
        assert_eq!(trim_forum_url("https://x/123"), "https://x/123");
        assert_eq!(trim_forum_url("https://x/discussion/123"), "https://x/discussion/123");
    }

    #[test]
    fn test_poster_precedence() {
        let mut record = MovieRecord::new("Poster");
        record.poster_secondary = Some("fweb.jpg".to_string());
        assert_eq!(record.display_poster(), Some("fweb.jpg"));

        record.poster_primary = Some("cover.jpg".to_string());
        assert_eq!(record.display_poster(), Some("cover.jpg"));

        record.poster_full = Some("full.jpg".to_string());
        assert_eq!(record.display_poster(), Some("full.jpg"));
    }

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(45), "45 min.");
        assert_eq!(format_runtime(60), "1 hr 0 min.");
        assert_eq!(format_runtime(155), "2 hr 35 min.");
        assert_eq!(format_runtime(0), "0 min.");
    }

    #[test]
    fn test_set_genres() {
        let mut record = MovieRecord::new("Genres");
        record.set_genres(["Dramat", " Komedia "]);
        assert_eq!(record.genres, "Dramat, Komedia");

        record.set_genres(Vec::<String>::new());
        assert_eq!(record.genres, NO_GENRES);
    }

    #[test]
    fn test_record_json_defaults() {
        let record: MovieRecord = serde_json::from_str(r#"{"title": "Only Title"}"#).unwrap();
        assert_eq!(record.genres, NO_GENRES);
        assert!(!record.released);
        assert!(record.url.is_none());
    }
}
