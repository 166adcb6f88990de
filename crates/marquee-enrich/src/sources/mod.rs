use async_trait::async_trait;
use marquee_core::MovieRecord;

use crate::error::Result;

/// An external film service that can add data to a [`MovieRecord`].
///
/// `lookup` runs concurrently with other lookups of the same source and only
/// sees the record it was given. `apply` runs afterwards on the coordinating
/// task and is the only place a source writes into a record.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    type Found: Send;

    fn name(&self) -> &'static str;

    /// `Ok(None)` means the service answered but knows no such movie.
    async fn lookup(&self, record: &MovieRecord) -> Result<Option<Self::Found>>;

    /// Returns the names of the fields that were written.
    fn apply(&self, record: &mut MovieRecord, found: Self::Found) -> Vec<&'static str>;
}

pub mod filmweb;
pub mod omdb;
