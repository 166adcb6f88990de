use std::path::{Path, PathBuf};
use std::time::Duration;

use marquee_core::config::ListingConfig;
use marquee_core::{AppConfig, MovieRecord, is_fresh, load_snapshot, rank, save_snapshot};
use tokio::sync::Mutex;

use crate::enrichment::{EnrichmentPipeline, EnrichmentReport};
use crate::error::Result;
use crate::listing::{self, HttpListing, ListingSource};
use crate::sources::EnrichmentSource;
use crate::sources::filmweb::FilmwebSource;
use crate::sources::omdb::OmdbSource;

/// Result of a full refresh.
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub movies: Vec<MovieRecord>,
    pub reports: Vec<EnrichmentReport>,
}

/// Listing scrape, both enrichment passes, ranking and the snapshot cache
/// behind one call.
pub struct RepertoireService<A = FilmwebSource, B = OmdbSource> {
    listing: Box<dyn ListingSource>,
    listing_config: ListingConfig,
    pipeline: EnrichmentPipeline<A, B>,
    snapshot_path: PathBuf,
    ttl: Duration,
    refresh_lock: Mutex<()>,
}

impl RepertoireService<FilmwebSource, OmdbSource> {
    /// Service reading the live listing configured in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let listing = HttpListing::new(&config.listing, &config.http)?;
        Self::with_listing(config, Box::new(listing))
    }

    pub fn with_listing(config: &AppConfig, listing: Box<dyn ListingSource>) -> Result<Self> {
        let pipeline = EnrichmentPipeline::from_config(config)?;
        Ok(Self::new(
            listing,
            config.listing.clone(),
            pipeline,
            config.snapshot_path(),
            config.cache_ttl(),
        ))
    }
}

impl<A, B> RepertoireService<A, B>
where
    A: EnrichmentSource,
    B: EnrichmentSource,
{
    pub fn new(
        listing: Box<dyn ListingSource>,
        listing_config: ListingConfig,
        pipeline: EnrichmentPipeline<A, B>,
        snapshot_path: PathBuf,
        ttl: Duration,
    ) -> Self {
        Self {
            listing,
            listing_config,
            pipeline,
            snapshot_path,
            ttl,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Ranked movies, from the snapshot when it is fresh and `force` is off.
    pub async fn movies(&self, force: bool) -> Result<Vec<MovieRecord>> {
        if !force && let Some(movies) = self.fresh_snapshot().await {
            return Ok(movies);
        }

        let _guard = self.refresh_lock.lock().await;
        // Someone else may have refreshed while we waited.
        if !force && let Some(movies) = self.fresh_snapshot().await {
            return Ok(movies);
        }
        Ok(self.refresh_locked().await?.movies)
    }

    /// Scrape and enrich unconditionally.
    pub async fn refresh(&self) -> Result<Refreshed> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn fresh_snapshot(&self) -> Option<Vec<MovieRecord>> {
        let path = self.snapshot_path.clone();
        let ttl = self.ttl;
        match tokio::task::spawn_blocking(move || read_fresh_snapshot(&path, ttl)).await {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!("snapshot check did not finish: {e}");
                None
            }
        }
    }

    async fn refresh_locked(&self) -> Result<Refreshed> {
        let mut catalog = listing::scrape(&*self.listing, &self.listing_config).await?;
        let reports = self.pipeline.run(&mut catalog).await;
        let movies = rank(catalog.into_records());

        let path = self.snapshot_path.clone();
        let to_disk = movies.clone();
        match tokio::task::spawn_blocking(move || save_snapshot(&path, &to_disk)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("failed to save snapshot {}: {e}", self.snapshot_path.display())
            }
            Err(e) => tracing::warn!("snapshot save did not finish: {e}"),
        }

        tracing::info!("refresh finished: {} movies ranked", movies.len());
        Ok(Refreshed { movies, reports })
    }
}

/// Snapshot contents when the file is younger than `ttl`. Blocking.
fn read_fresh_snapshot(path: &Path, ttl: Duration) -> Option<Vec<MovieRecord>> {
    if !is_fresh(path, ttl) {
        return None;
    }
    match load_snapshot(path) {
        Ok(movies) => {
            tracing::debug!("using snapshot {} ({} movies)", path.display(), movies.len());
            Some(movies)
        }
        Err(e) => {
            tracing::warn!("ignoring unreadable snapshot {}: {e}", path.display());
            None
        }
    }
}
