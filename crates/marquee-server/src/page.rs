//! Server-rendered movie list.

use std::fmt::Write;

use marquee_core::MovieRecord;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn score(value: f64) -> String {
    if value > 0.0 {
        format!("{value:.1}")
    } else {
        "-".to_string()
    }
}

fn render_movie(out: &mut String, movie: &MovieRecord) {
    let _ = write!(out, "<article class=\"movie\">");

    if let Some(poster) = movie.display_poster() {
        let _ = write!(
            out,
            "<img class=\"poster\" src=\"{}\" alt=\"{}\">",
            escape(poster),
            escape(&movie.title)
        );
    }

    let _ = write!(out, "<h2>{}</h2>", escape(&movie.title));
    if let Some(eng) = &movie.title_eng {
        let _ = write!(out, "<h3>{}</h3>", escape(eng));
    }

    let _ = write!(
        out,
        "<p class=\"ratings\">IMDb: {} | Filmweb: {}</p>",
        score(movie.rating.imdb()),
        score(movie.rating.fweb())
    );

    let mut facts = vec![escape(&movie.genres)];
    if let Some(year) = movie.year {
        facts.push(year.to_string());
    }
    if let Some(runtime) = movie.pretty_runtime() {
        facts.push(runtime);
    }
    let _ = write!(out, "<p class=\"facts\">{}</p>", facts.join(" | "));

    if !movie.released {
        let premiere = movie.date.as_deref().unwrap_or("soon");
        let _ = write!(out, "<p class=\"premiere\">Premiere: {}</p>", escape(premiere));
    }

    if !movie.description.is_empty() {
        let _ = write!(out, "<p>{}</p>", escape(&movie.description));
    }
    if let Some(url) = &movie.url {
        let _ = write!(out, "<a href=\"{}\">Forum</a>", escape(url));
    }

    out.push_str("</article>\n");
}

/// Whole page for an already ranked list.
pub fn render(movies: &[MovieRecord]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Marquee</title></head><body>\n",
    );
    if movies.is_empty() {
        out.push_str("<p>No movies found.</p>\n");
    }
    for movie in movies {
        render_movie(&mut out, movie);
    }
    out.push_str("</body></html>\n");
    out
}
