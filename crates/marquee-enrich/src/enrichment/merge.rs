use marquee_core::{MovieRecord, trim_forum_url};

use crate::sources::filmweb::FilmInfo;
use crate::sources::omdb::OmdbMovie;

/// Writes source results into a record.
///
/// Only fields the source actually reported are touched; an absent value
/// never clears what the record already holds.
pub trait MergeEnrichment {
    fn merge_filmweb(&mut self, info: FilmInfo, poster_base_url: &str) -> Vec<&'static str>;
    fn merge_omdb(&mut self, movie: OmdbMovie) -> Vec<&'static str>;
}

impl MergeEnrichment for MovieRecord {
    fn merge_filmweb(&mut self, info: FilmInfo, poster_base_url: &str) -> Vec<&'static str> {
        let mut updated = Vec::new();

        if let Some(rating) = info.rating {
            self.rating.set_fweb(rating);
            updated.push("rating.fweb");
        }
        if let Some(title_eng) = info.title_eng {
            self.title_eng = Some(title_eng);
            updated.push("title_eng");
        }
        if let Some(year) = info.year {
            self.year = Some(year);
            updated.push("year");
        }
        if let Some(url) = info.forum_url {
            self.url = Some(trim_forum_url(&url).to_string());
            updated.push("url");
        }
        if let Some(path) = info.poster_path {
            self.poster_secondary = Some(format!("{poster_base_url}{path}"));
            updated.push("poster_secondary");
        }

        updated
    }

    fn merge_omdb(&mut self, movie: OmdbMovie) -> Vec<&'static str> {
        let mut updated = Vec::new();

        if let Some(rating) = movie.rating {
            self.rating.set_imdb(rating);
            updated.push("rating.imdb");
        }
        if let Some(cover) = movie.cover_url {
            self.poster_primary = Some(cover);
            updated.push("poster_primary");
        }
        if let Some(full) = movie.full_cover_url {
            self.poster_full = Some(full);
            updated.push("poster_full");
        }
        if movie.runtime > 0 {
            self.runtime = Some(movie.runtime);
            updated.push("runtime");
        }

        updated
    }
}
