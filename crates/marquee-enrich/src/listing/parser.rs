use chrono::{Days, NaiveDate};
use marquee_core::{MovieCatalog, MovieRecord};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

const DATE_FORMAT: &str = "%d.%m.%Y";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static ITEM: Lazy<Selector> = Lazy::new(|| selector(".filmlist__info--inverted"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"[rv-text="item.title"]"#));
static RATING: Lazy<Selector> = Lazy::new(|| selector(r#"[rv-text="item.rank_value"]"#));
static VOTES: Lazy<Selector> = Lazy::new(|| selector(r#"[rv-text="item.rank_votes"]"#));
static RELEASE: Lazy<Selector> = Lazy::new(|| selector(r#"[rv-text="item.info_release"]"#));
static SYNOPSIS: Lazy<Selector> = Lazy::new(|| selector(r#"[rv-text="item.synopsis_short"]"#));
static GENRE: Lazy<Selector> = Lazy::new(|| selector(r#"[rv-text="genre.name"]"#));
static CATEGORY: Lazy<Selector> = Lazy::new(|| selector(r#"[rv-text="category.name"]"#));

/// Raw fields of one movie on the listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingItem {
    pub title: String,
    pub rating: String,
    pub votes: String,
    pub release: String,
    pub description: String,
    pub genres: Vec<String>,
}

fn raw_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn text_of(el: ElementRef<'_>) -> String {
    raw_text(el).trim().to_string()
}

fn first_text(item: ElementRef<'_>, sel: &Selector) -> String {
    item.select(sel).next().map(text_of).unwrap_or_default()
}

fn all_texts(item: ElementRef<'_>, sel: &Selector) -> Vec<String> {
    item.select(sel)
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extract every movie block from a rendered repertoire page.
pub fn parse_listing(html: &str) -> Vec<ListingItem> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for item in document.select(&ITEM) {
        // The title is the join key for every later stage; keep it as scraped.
        let title = item.select(&TITLE).next().map(raw_text).unwrap_or_default();
        if title.trim().is_empty() {
            tracing::debug!("skipping listing entry without a title");
            continue;
        }

        let mut genres = all_texts(item, &GENRE);
        if genres.is_empty() {
            genres = all_texts(item, &CATEGORY);
        }

        items.push(ListingItem {
            title,
            rating: first_text(item, &RATING),
            votes: first_text(item, &VOTES),
            release: first_text(item, &RELEASE),
            description: first_text(item, &SYNOPSIS),
            genres,
        });
    }

    items
}

/// Which listing entries make it into the catalog.
#[derive(Debug, Clone)]
pub struct ListingFilter {
    pub window_days: u32,
    pub denylist: Vec<String>,
}

impl ListingFilter {
    pub fn is_denied(&self, title: &str) -> bool {
        self.denylist
            .iter()
            .any(|keyword| !keyword.is_empty() && title.contains(keyword.as_str()))
    }
}

/// Turn parsed entries into a deduplicated catalog as seen on `today`.
///
/// Entries released more than `window_days` after `today` and titles hitting
/// the denylist are dropped. An unreadable release date keeps the entry and
/// counts as released.
pub fn build_catalog(items: Vec<ListingItem>, filter: &ListingFilter, today: NaiveDate) -> MovieCatalog {
    let horizon = today
        .checked_add_days(Days::new(u64::from(filter.window_days)))
        .unwrap_or(NaiveDate::MAX);
    let mut catalog = MovieCatalog::new();

    for item in items {
        if filter.is_denied(&item.title) {
            tracing::debug!("skipping denylisted title {:?}", item.title);
            continue;
        }

        let released = match NaiveDate::parse_from_str(&item.release, DATE_FORMAT) {
            Ok(date) if date > horizon => {
                tracing::debug!("skipping {:?}: premiere {date} is past {horizon}", item.title);
                continue;
            }
            Ok(date) => date <= today,
            Err(_) => true,
        };

        let mut record = MovieRecord::new(item.title);
        record.votes = item.votes;
        record.date = (!item.release.is_empty()).then_some(item.release);
        record.description = item.description;
        record.set_genres(&item.genres);
        record.rating.set_mul(item.rating.as_str());
        record.released = released;

        let title = record.title.clone();
        if !catalog.insert(record) {
            tracing::info!("duplicate listing entry for {title:?} dropped");
        }
    }

    tracing::info!(
        "Total movies found (+{} days from now): {}",
        filter.window_days,
        catalog.len()
    );
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, release: &str, genres: &[&str]) -> String {
        let genres: String = genres
            .iter()
            .map(|g| format!(r#"<a rv-text="genre.name">{g}</a>"#))
            .collect();
        format!(
            r#"<div class="filmlist__info filmlist__info--inverted">
                <h2><span rv-text="item.title">{title}</span></h2>
                <span rv-text="item.rank_value">7,4</span>
                <span rv-text="item.rank_votes">1234</span>
                <span rv-text="item.info_release">{release}</span>
                <p rv-text="item.synopsis_short"> Opis filmu. </p>
                {genres}
            </div>"#
        )
    }

    fn page(entries: &[String]) -> String {
        format!("<html><body>{}</body></html>", entries.concat())
    }

    fn filter() -> ListingFilter {
        ListingFilter {
            window_days: 7,
            denylist: vec!["Met Opera".to_string()],
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_parse_listing_fields() {
        let html = page(&[entry("Diuna: Część druga", "01.03.2024", &["Sci-Fi", "Przygodowy"])]);
        let items = parse_listing(&html);

        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "Diuna: Część druga");
        assert_eq!(item.rating, "7,4");
        assert_eq!(item.votes, "1234");
        assert_eq!(item.release, "01.03.2024");
        assert_eq!(item.description, "Opis filmu.");
        assert_eq!(item.genres, vec!["Sci-Fi", "Przygodowy"]);
    }

    #[test]
    fn test_parse_listing_category_fallback() {
        let html = page(&[r#"<div class="filmlist__info--inverted">
                <span rv-text="item.title">Koncert</span>
                <span rv-text="category.name">Wydarzenie</span>
            </div>"#
            .to_string()]);
        let items = parse_listing(&html);
        assert_eq!(items[0].genres, vec!["Wydarzenie"]);
        assert_eq!(items[0].rating, "");
    }

    #[test]
    fn test_parse_listing_keeps_title_verbatim() {
        let html = page(&[entry(" Kler ", "01.03.2024", &[])]);
        let items = parse_listing(&html);
        assert_eq!(items[0].title, " Kler ");

        let catalog = build_catalog(items, &filter(), today());
        assert!(catalog.get(" Kler ").is_some());
        assert!(catalog.get("Kler").is_none());
    }

    #[test]
    fn test_parse_listing_skips_untitled() {
        let html = page(&[r#"<div class="filmlist__info--inverted"><span>?</span></div>"#.to_string()]);
        assert!(parse_listing(&html).is_empty());
    }

    #[test]
    fn test_build_catalog_filters_and_flags() {
        let html = page(&[
            entry("Released", "01.03.2024", &["Dramat"]),
            entry("Soon", "15.03.2024", &[]),
            entry("Far Future", "30.04.2024", &[]),
            entry("Met Opera: Carmen", "09.03.2024", &[]),
            entry("Released", "02.03.2024", &["Komedia"]),
        ]);
        let catalog = build_catalog(parse_listing(&html), &filter(), today());

        assert_eq!(catalog.titles().collect::<Vec<_>>(), vec!["Released", "Soon"]);

        let released = catalog.get("Released").unwrap();
        assert!(released.released);
        assert_eq!(released.genres, "Dramat");
        assert_eq!(released.rating.mul(), 7.4);
        assert_eq!(released.date.as_deref(), Some("01.03.2024"));

        let soon = catalog.get("Soon").unwrap();
        assert!(!soon.released);
        assert_eq!(soon.genres, "-");
    }

    #[test]
    fn test_build_catalog_unparsable_date_kept() {
        let html = page(&[entry("No Date", "wkrótce", &[])]);
        let catalog = build_catalog(parse_listing(&html), &filter(), today());
        let record = catalog.get("No Date").unwrap();
        assert!(record.released);
        assert_eq!(record.date.as_deref(), Some("wkrótce"));
    }
}
