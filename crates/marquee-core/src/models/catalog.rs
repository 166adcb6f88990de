use std::collections::HashMap;

use super::movie::MovieRecord;

/// Title-keyed collection of movie records in listing order.
///
/// Titles are unique: inserting a title that is already present keeps the
/// first record and rejects the new one.
#[derive(Debug, Clone, Default)]
pub struct MovieCatalog {
    records: Vec<MovieRecord>,
    index: HashMap<String, usize>,
}

impl MovieCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Returns `false` when the title was already present.
    pub fn insert(&mut self, record: MovieRecord) -> bool {
        if self.index.contains_key(&record.title) {
            return false;
        }
        self.index.insert(record.title.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, title: &str) -> Option<&MovieRecord> {
        self.index.get(title).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, title: &str) -> Option<&mut MovieRecord> {
        match self.index.get(title) {
            Some(&i) => self.records.get_mut(i),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.title.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MovieRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<MovieRecord> {
        self.records
    }
}

impl FromIterator<MovieRecord> for MovieCatalog {
    fn from_iter<T: IntoIterator<Item = MovieRecord>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a MovieCatalog {
    type Item = &'a MovieRecord;
    type IntoIter = std::slice::Iter<'a, MovieRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
