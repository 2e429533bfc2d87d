use std::collections::HashMap;

use crate::models::{AggregateStats, BranchSummary, PackageStats, PlacementStatus, StudentRecord};

const UNASSIGNED_BRANCH: &str = "Unassigned";

/// Summary over the whole store. The filtered view has no effect here.
pub fn aggregate(records: &[StudentRecord]) -> AggregateStats {
    let mut counts: HashMap<PlacementStatus, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.placement_status).or_insert(0) += 1;
    }

    let count_by_status = PlacementStatus::ALL
        .into_iter()
        .map(|status| (status, counts.get(&status).copied().unwrap_or(0)))
        .collect();

    let packages: Vec<f64> = records
        .iter()
        .filter_map(StudentRecord::current_package_lakhs)
        .collect();

    let placed = counts.get(&PlacementStatus::Placed).copied().unwrap_or(0);

    AggregateStats {
        total_count: records.len(),
        count_by_status,
        package: package_stats(&packages),
        placement_rate: percentage(placed, records.len()),
    }
}

pub fn package_stats(packages: &[f64]) -> PackageStats {
    if packages.is_empty() {
        return PackageStats::default();
    }

    let mut sorted = packages.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let sum: f64 = sorted.iter().sum();
    PackageStats {
        count: sorted.len(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: round_one_decimal(sum / sorted.len() as f64),
        median: median_of_sorted(&sorted),
    }
}

/// `sorted` must be ascending and non-empty.
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_one_decimal(100.0 * part as f64 / total as f64)
    }
}

pub fn summarize_by_branch(records: &[StudentRecord]) -> Vec<BranchSummary> {
    // branch -> (total, placed, package sum, package count)
    let mut map: HashMap<&str, (usize, usize, f64, usize)> = HashMap::new();

    for record in records {
        let branch = record.branch.as_deref().unwrap_or(UNASSIGNED_BRANCH);
        let entry = map.entry(branch).or_insert((0, 0, 0.0, 0));
        entry.0 += 1;
        if record.placement_status == PlacementStatus::Placed {
            entry.1 += 1;
        }
        if let Some(lakhs) = record.current_package_lakhs() {
            entry.2 += lakhs;
            entry.3 += 1;
        }
    }

    let mut summaries: Vec<BranchSummary> = map
        .into_iter()
        .map(|(branch, (total, placed, sum, with_package))| BranchSummary {
            branch: branch.to_string(),
            total,
            placed,
            avg_package: if with_package == 0 {
                0.0
            } else {
                round_one_decimal(sum / with_package as f64)
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.branch.cmp(&b.branch)));
    summaries
}
