pub mod merge;
pub mod pipeline;

pub use merge::MergeEnrichment;
pub use pipeline::{EnrichmentPipeline, EnrichmentReport, run_pass};
