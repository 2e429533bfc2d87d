use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::models::{SortDirection, SortKey, SortSpec, StudentRecord};

/// Stable sort. Direction flips the comparator result, so equal keys keep
/// their incoming order whichever way the list is sorted.
pub fn sort_students<R: Borrow<StudentRecord>>(records: &mut [R], spec: SortSpec) {
    records.sort_by(|a, b| {
        let ordering = compare(a.borrow(), b.borrow(), spec.key);
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

pub fn compare(a: &StudentRecord, b: &StudentRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.full_name().cmp(&b.full_name()),
        SortKey::RegistrationNumber => {
            let left = a.registration_number.as_deref().unwrap_or("");
            let right = b.registration_number.as_deref().unwrap_or("");
            left.cmp(right)
        }
        SortKey::Cgpa => a.cgpa.unwrap_or(0.0).total_cmp(&b.cgpa.unwrap_or(0.0)),
        SortKey::Package => {
            let left = a.current_package_lakhs().unwrap_or(0.0);
            let right = b.current_package_lakhs().unwrap_or(0.0);
            left.total_cmp(&right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ids, placed, student};

    fn spec(key: SortKey, direction: SortDirection) -> SortSpec {
        SortSpec { key, direction }
    }

    fn with_cgpa(id: &str, first: &str, cgpa: Option<f64>) -> StudentRecord {
        let mut record = student(id, first, "Student");
        record.cgpa = cgpa;
        record
    }

    #[test]
    fn name_sort_is_case_sensitive() {
        let store = vec![
            student("s1", "bella", "Ray"),
            student("s2", "Zoe", "Kim"),
            student("s3", "Adam", "Fox"),
        ];
        let mut view: Vec<&StudentRecord> = store.iter().collect();
        sort_students(&mut view, spec(SortKey::Name, SortDirection::Ascending));
        assert_eq!(ids(&view), vec!["s3", "s2", "s1"]);
    }

    #[test]
    fn missing_registration_sorts_first_ascending() {
        let mut a = student("s1", "A", "A");
        a.registration_number = Some("21BCE0002".to_string());
        let b = student("s2", "B", "B");
        let mut c = student("s3", "C", "C");
        c.registration_number = Some("21BCE0001".to_string());
        let store = vec![a, b, c];

        let mut view: Vec<&StudentRecord> = store.iter().collect();
        sort_students(
            &mut view,
            spec(SortKey::RegistrationNumber, SortDirection::Ascending),
        );
        assert_eq!(ids(&view), vec!["s2", "s3", "s1"]);
    }

    #[test]
    fn missing_cgpa_counts_as_zero() {
        let store = vec![
            with_cgpa("s1", "A", Some(8.1)),
            with_cgpa("s2", "B", None),
            with_cgpa("s3", "C", Some(6.5)),
        ];
        let mut view: Vec<&StudentRecord> = store.iter().collect();
        sort_students(&mut view, spec(SortKey::Cgpa, SortDirection::Descending));
        assert_eq!(ids(&view), vec!["s1", "s3", "s2"]);
    }

    #[test]
    fn package_sort_uses_current_offer() {
        let store = vec![
            placed("s1", "A", "A", "Acme", 800_000.0),
            student("s2", "B", "B"),
            placed("s3", "C", "C", "Globex", 1_200_000.0),
        ];
        let mut view: Vec<&StudentRecord> = store.iter().collect();
        sort_students(&mut view, spec(SortKey::Package, SortDirection::Descending));
        assert_eq!(ids(&view), vec!["s3", "s1", "s2"]);
    }

    #[test]
    fn ties_keep_input_order_in_both_directions() {
        let store = vec![
            with_cgpa("s1", "A", Some(7.0)),
            with_cgpa("s2", "B", Some(9.0)),
            with_cgpa("s3", "C", Some(7.0)),
            with_cgpa("s4", "D", Some(9.0)),
        ];

        let mut view: Vec<&StudentRecord> = store.iter().collect();
        sort_students(&mut view, spec(SortKey::Cgpa, SortDirection::Ascending));
        assert_eq!(ids(&view), vec!["s1", "s3", "s2", "s4"]);

        let mut view: Vec<&StudentRecord> = store.iter().collect();
        sort_students(&mut view, spec(SortKey::Cgpa, SortDirection::Descending));
        assert_eq!(ids(&view), vec!["s2", "s4", "s1", "s3"]);
    }

    #[test]
    fn sorting_twice_changes_nothing() {
        let store = vec![
            with_cgpa("s1", "A", Some(7.0)),
            with_cgpa("s2", "B", None),
            with_cgpa("s3", "C", Some(7.0)),
            with_cgpa("s4", "D", Some(9.5)),
        ];
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let mut once: Vec<&StudentRecord> = store.iter().collect();
            sort_students(&mut once, spec(SortKey::Cgpa, direction));
            let mut twice = once.clone();
            sort_students(&mut twice, spec(SortKey::Cgpa, direction));
            assert_eq!(ids(&once), ids(&twice));
        }
    }

    #[test]
    fn descending_is_reverse_of_ascending_without_ties() {
        let store = vec![
            with_cgpa("s1", "A", Some(7.2)),
            with_cgpa("s2", "B", Some(9.1)),
            with_cgpa("s3", "C", Some(5.4)),
        ];
        let mut asc: Vec<&StudentRecord> = store.iter().collect();
        sort_students(&mut asc, spec(SortKey::Cgpa, SortDirection::Ascending));
        let mut desc: Vec<&StudentRecord> = store.iter().collect();
        sort_students(&mut desc, spec(SortKey::Cgpa, SortDirection::Descending));

        asc.reverse();
        assert_eq!(ids(&asc), ids(&desc));
    }

    #[test]
    fn owned_records_sort_too() {
        let mut store = vec![with_cgpa("s1", "A", Some(9.0)), with_cgpa("s2", "B", Some(6.0))];
        sort_students(&mut store, spec(SortKey::Cgpa, SortDirection::Ascending));
        assert_eq!(store[0].id.0, "s2");
    }
}
