use futures::StreamExt;
use marquee_core::{AppConfig, MovieCatalog};
use serde::Serialize;

use crate::error::Result;
use crate::sources::EnrichmentSource;
use crate::sources::filmweb::FilmwebSource;
use crate::sources::omdb::OmdbSource;

/// Outcome of one enrichment pass over a catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichmentReport {
    pub source: String,
    pub enriched: Vec<String>,
    pub unmatched: Vec<String>,
    pub errors: Vec<String>,
    pub fields_updated: Vec<String>,
}

impl EnrichmentReport {
    fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    fn add_enriched(&mut self, title: String, fields: Vec<&'static str>) {
        for field in fields {
            push_unique(&mut self.fields_updated, field.to_string());
        }
        self.enriched.push(title);
    }

    fn add_error(&mut self, title: &str, error: impl std::fmt::Display) {
        self.errors.push(format!("{title}: {error}"));
    }

    pub fn attempted(&self) -> usize {
        self.enriched.len() + self.unmatched.len() + self.errors.len()
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Run one source over every record in the catalog.
///
/// At most `concurrency` lookups are in flight at a time. Lookups only read
/// the catalog; results are written back by title once every lookup of the
/// pass has finished. A failed or empty lookup leaves its record untouched.
pub async fn run_pass<S>(
    source: &S,
    catalog: &mut MovieCatalog,
    concurrency: usize,
) -> EnrichmentReport
where
    S: EnrichmentSource,
{
    tracing::info!(
        "{} pass: {} titles, concurrency {}",
        source.name(),
        catalog.len(),
        concurrency
    );

    let outcomes: Vec<_> = futures::stream::iter(catalog.iter())
        .map(|record| async move { (record.title.clone(), source.lookup(record).await) })
        .buffer_unordered(concurrency.max(1))
        .boxed()
        .collect()
        .await;

    let mut report = EnrichmentReport::new(source.name());
    for (title, outcome) in outcomes {
        match outcome {
            Ok(Some(found)) => {
                if let Some(record) = catalog.get_mut(&title) {
                    let fields = source.apply(record, found);
                    report.add_enriched(title, fields);
                }
            }
            Ok(None) => {
                tracing::info!("{}: no data for {title:?}", source.name());
                report.unmatched.push(title);
            }
            Err(err) => {
                tracing::warn!("{}: lookup failed for {title:?}: {err}", source.name());
                report.add_error(&title, err);
            }
        }
    }

    tracing::info!(
        "{} pass done: {} enriched, {} without match, {} failed",
        report.source,
        report.enriched.len(),
        report.unmatched.len(),
        report.errors.len()
    );
    report
}

/// Filmweb pass followed by the movie database pass.
pub struct EnrichmentPipeline<A = FilmwebSource, B = OmdbSource> {
    first: A,
    second: B,
    first_concurrency: usize,
    second_concurrency: usize,
}

impl EnrichmentPipeline<FilmwebSource, OmdbSource> {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.omdb_api_key()?;
        let filmweb = FilmwebSource::new(&config.filmweb, &config.http)?;
        let omdb = OmdbSource::new(&config.omdb, &config.http, api_key)?;
        Ok(Self::new(
            filmweb,
            config.filmweb.concurrency,
            omdb,
            config.omdb.concurrency,
        ))
    }
}

impl<A, B> EnrichmentPipeline<A, B>
where
    A: EnrichmentSource,
    B: EnrichmentSource,
{
    pub fn new(first: A, first_concurrency: usize, second: B, second_concurrency: usize) -> Self {
        Self {
            first,
            second,
            first_concurrency,
            second_concurrency,
        }
    }

    /// Enrich every record in place. The second pass starts only after the
    /// first one has been merged, so it can use what the first one found.
    pub async fn run(&self, catalog: &mut MovieCatalog) -> Vec<EnrichmentReport> {
        let first = run_pass(&self.first, catalog, self.first_concurrency).await;
        let second = run_pass(&self.second, catalog, self.second_concurrency).await;
        vec![first, second]
    }
}
