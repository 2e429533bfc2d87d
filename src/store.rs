use crate::filter::filter_students;
use crate::models::{AggregateStats, FilterCriteria, SortSpec, StudentId, StudentRecord};
use crate::sort::sort_students;
use crate::stats;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("student '{0}' is not in the loaded records")]
    NotFound(StudentId),
}

/// Last successfully fetched snapshot of the student list.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<StudentRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<StudentRecord>) -> Self {
        RecordStore { records }
    }

    /// Swaps in a complete snapshot. Readers never see a partial update.
    pub fn replace(&mut self, records: Vec<StudentRecord>) {
        tracing::info!(count = records.len(), "record store replaced");
        self.records = records;
    }

    /// Applies the record a create or update call returned.
    pub fn upsert(&mut self, record: StudentRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn get(&self, id: &StudentId) -> Option<&StudentRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// State shared by the console views: the store plus the current filter,
/// sort and selection.
#[derive(Debug, Clone, Default)]
pub struct ConsoleState {
    pub store: RecordStore,
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
    selected: Option<StudentId>,
}

impl ConsoleState {
    pub fn new(store: RecordStore) -> Self {
        ConsoleState {
            store,
            ..ConsoleState::default()
        }
    }

    /// Filtered then sorted view of the store.
    pub fn view(&self) -> Vec<&StudentRecord> {
        let mut view = filter_students(self.store.records(), &self.criteria);
        sort_students(&mut view, self.sort);
        view
    }

    /// Always computed over the full store, whatever the filter.
    pub fn stats(&self) -> AggregateStats {
        stats::aggregate(self.store.records())
    }

    pub fn select(&mut self, id: &StudentId) -> Result<&StudentRecord, StoreError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.selected = Some(id.clone());
        Ok(record)
    }

    pub fn selected(&self) -> Option<&StudentRecord> {
        self.selected.as_ref().and_then(|id| self.store.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlacementStatus, SortDirection, SortKey};
    use crate::testing::{ids, placed, student};

    fn state() -> ConsoleState {
        ConsoleState::new(RecordStore::new(vec![
            placed("s1", "Avery", "Lee", "Acme", 1_200_000.0),
            placed("s2", "Jules", "Moreno", "Globex", 800_000.0),
            student("s3", "Kiara", "Patel"),
        ]))
    }

    #[test]
    fn view_filters_then_sorts() {
        let mut state = state();
        state.criteria.status = Some(PlacementStatus::Placed);
        state.sort = SortSpec {
            key: SortKey::Package,
            direction: SortDirection::Ascending,
        };
        assert_eq!(ids(&state.view()), vec!["s2", "s1"]);
    }

    #[test]
    fn stats_ignore_the_filter() {
        let mut state = state();
        state.criteria.search = "kiara".to_string();
        assert_eq!(state.view().len(), 1);
        assert_eq!(state.stats().total_count, 3);
    }

    #[test]
    fn upsert_replaces_by_id_or_appends() {
        let mut store = RecordStore::default();
        store.upsert(student("s1", "Avery", "Lee"));
        store.upsert(student("s2", "Jules", "Moreno"));
        store.upsert(placed("s1", "Avery", "Lee", "Acme", 900_000.0));

        assert_eq!(store.len(), 2);
        let updated = store.get(&StudentId::from("s1")).unwrap();
        assert_eq!(updated.placement_status, PlacementStatus::Placed);
        assert_eq!(store.records()[0].id.0, "s1");
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let mut store = RecordStore::new(vec![student("s1", "Avery", "Lee")]);
        store.replace(vec![student("s9", "Nia", "Okafor"), student("s8", "Oli", "Ng")]);
        assert_eq!(store.len(), 2);
        assert!(store.get(&StudentId::from("s1")).is_none());
    }

    #[test]
    fn selection_tracks_known_ids() {
        let mut state = state();
        assert!(state.selected().is_none());
        assert_eq!(
            state.select(&StudentId::from("nope")).unwrap_err(),
            StoreError::NotFound(StudentId::from("nope"))
        );

        state.select(&StudentId::from("s3")).unwrap();
        assert_eq!(state.selected().map(|r| r.id.0.as_str()), Some("s3"));
    }
}
