//! Marquee Enrich: listing scrape, Filmweb and OMDb lookups, enrichment pipeline.

pub mod enrichment;
pub mod error;
pub mod http;
pub mod listing;
pub mod service;
pub mod sources;

pub use enrichment::{EnrichmentPipeline, EnrichmentReport};
pub use error::{EnrichError, Result};
pub use listing::{FileListing, HttpListing, ListingSource};
pub use service::{Refreshed, RepertoireService};
pub use sources::{EnrichmentSource, filmweb::FilmwebSource, omdb::OmdbSource};
