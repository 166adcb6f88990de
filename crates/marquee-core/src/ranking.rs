use crate::models::MovieRecord;

/// Order records by IMDb rating, highest first.
///
/// The sort is stable, so records with equal ratings keep their input order.
pub fn rank(mut records: Vec<MovieRecord>) -> Vec<MovieRecord> {
    records.sort_by(|a, b| b.sort_rating().total_cmp(&a.sort_rating()));
    records
}
