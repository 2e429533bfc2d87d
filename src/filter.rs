use std::collections::BTreeSet;

use crate::models::{FilterCriteria, StudentRecord};

pub fn filter_students<'a>(
    records: &'a [StudentRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a StudentRecord> {
    let needle = criteria.search.trim().to_lowercase();
    records
        .iter()
        .filter(|record| matches(record, criteria, &needle))
        .collect()
}

fn matches(record: &StudentRecord, criteria: &FilterCriteria, needle: &str) -> bool {
    if let Some(status) = criteria.status {
        if record.placement_status != status {
            return false;
        }
    }

    if let Some(branch) = criteria.branch.as_deref() {
        if record.branch.as_deref() != Some(branch) {
            return false;
        }
    }

    if let Some(batch) = criteria.batch {
        if record.batch_year != Some(batch) {
            return false;
        }
    }

    needle.is_empty() || matches_search(record, needle)
}

/// `needle` must already be lowercased. Plain substring containment.
fn matches_search(record: &StudentRecord, needle: &str) -> bool {
    let has_name = record.first_name.is_some() || record.last_name.is_some();
    if has_name && record.full_name().to_lowercase().contains(needle) {
        return true;
    }

    [&record.registration_number, &record.college_email]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
}

/// Distinct branches and batch years present in a store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub branches: Vec<String>,
    pub batches: Vec<i32>,
}

impl FilterOptions {
    pub fn collect(records: &[StudentRecord]) -> Self {
        let branches: BTreeSet<&str> = records.iter().filter_map(|r| r.branch.as_deref()).collect();
        let batches: BTreeSet<i32> = records.iter().filter_map(|r| r.batch_year).collect();

        FilterOptions {
            branches: branches.into_iter().map(str::to_string).collect(),
            batches: batches.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlacementStatus;
    use crate::testing::{ids, placed, student};

    fn sample_store() -> Vec<StudentRecord> {
        let mut avery = placed("s1", "Avery", "Lee", "Acme", 1_200_000.0);
        avery.branch = Some("CSE".to_string());
        avery.batch_year = Some(2025);
        avery.registration_number = Some("21BCE1001".to_string());
        avery.college_email = Some("avery.lee@college.edu".to_string());

        let mut jules = student("s2", "Jules", "Moreno");
        jules.branch = Some("ECE".to_string());
        jules.batch_year = Some(2025);
        jules.college_email = Some("contact@acmecorp.com".to_string());

        let mut kiara = student("s3", "Kiara", "Patel");
        kiara.batch_year = Some(2026);
        kiara.registration_number = Some("22BCE(1)+3".to_string());

        vec![avery, jules, kiara]
    }

    #[test]
    fn wildcard_criteria_keep_everything() {
        let store = sample_store();
        let filtered = filter_students(&store, &FilterCriteria::default());
        assert_eq!(ids(&filtered), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn empty_store_yields_empty_result() {
        let criteria = FilterCriteria {
            search: "anything".to_string(),
            ..FilterCriteria::default()
        };
        assert!(filter_students(&[], &criteria).is_empty());
    }

    #[test]
    fn criteria_combine_with_and() {
        let store = sample_store();
        let criteria = FilterCriteria {
            status: Some(PlacementStatus::Unplaced),
            batch: Some(2025),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_students(&store, &criteria)), vec!["s2"]);
    }

    #[test]
    fn missing_branch_never_matches_active_branch() {
        let store = sample_store();
        let criteria = FilterCriteria {
            branch: Some("CSE".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_students(&store, &criteria)), vec!["s1"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let store = sample_store();
        let criteria = FilterCriteria {
            search: "ACME".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_students(&store, &criteria)), vec!["s2"]);
    }

    #[test]
    fn search_spans_name_parts() {
        let store = sample_store();
        let criteria = FilterCriteria {
            search: "lee".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_students(&store, &criteria)), vec!["s1"]);

        let criteria = FilterCriteria {
            search: "avery lee".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_students(&store, &criteria)), vec!["s1"]);
    }

    #[test]
    fn search_treats_metacharacters_literally() {
        let store = sample_store();
        let criteria = FilterCriteria {
            search: "(1)+".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&filter_students(&store, &criteria)), vec!["s3"]);

        let criteria = FilterCriteria {
            search: ".*".to_string(),
            ..FilterCriteria::default()
        };
        assert!(filter_students(&store, &criteria).is_empty());
    }

    #[test]
    fn filtering_preserves_relative_order() {
        let store = sample_store();
        let criteria = FilterCriteria {
            search: "e".to_string(),
            ..FilterCriteria::default()
        };
        let filtered = filter_students(&store, &criteria);
        let positions: Vec<usize> = filtered
            .iter()
            .map(|r| store.iter().position(|s| s.id == r.id).unwrap_or(usize::MAX))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn options_list_distinct_sorted_values() {
        let options = FilterOptions::collect(&sample_store());
        assert_eq!(options.branches, vec!["CSE", "ECE"]);
        assert_eq!(options.batches, vec![2025, 2026]);
    }
}
