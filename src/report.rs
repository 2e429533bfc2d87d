use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{SortDirection, SortKey, SortSpec, StudentRecord};
use crate::sort::sort_students;
use crate::stats;

pub fn build_report(
    scope: Option<&str>,
    generated_on: NaiveDate,
    records: &[StudentRecord],
    view: &[&StudentRecord],
) -> String {
    let summary = stats::aggregate(records);
    let branches = stats::summarize_by_branch(records);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all students");

    let _ = writeln!(output, "# Placement Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} ({} of {} students listed)",
        generated_on,
        scope_label,
        view.len(),
        summary.total_count
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");

    if summary.total_count == 0 {
        let _ = writeln!(output, "No students loaded.");
    } else {
        for (status, count) in summary.count_by_status.iter() {
            let _ = writeln!(output, "- {}: {}", status, count);
        }
        let _ = writeln!(output, "- placement rate: {:.1}%", summary.placement_rate);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Packages (LPA)");

    if summary.package.count == 0 {
        let _ = writeln!(output, "No packages recorded.");
    } else {
        let package = summary.package;
        let _ = writeln!(
            output,
            "- {} offers: min {:.1}, max {:.1}, mean {:.1}, median {:.1}",
            package.count, package.min, package.max, package.mean, package.median
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Branches");

    if branches.is_empty() {
        let _ = writeln!(output, "No students loaded.");
    } else {
        for branch in branches.iter() {
            let _ = writeln!(
                output,
                "- {}: {} placed of {} (avg package {:.1} LPA)",
                branch.branch, branch.placed, branch.total, branch.avg_package
            );
        }
    }

    let mut top = view.to_vec();
    sort_students(
        &mut top,
        SortSpec {
            key: SortKey::Package,
            direction: SortDirection::Descending,
        },
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Packages");

    let with_offer: Vec<&&StudentRecord> = top
        .iter()
        .filter(|r| r.current_package_lakhs().is_some())
        .take(10)
        .collect();
    if with_offer.is_empty() {
        let _ = writeln!(output, "No offers in this selection.");
    } else {
        for record in with_offer {
            let _ = writeln!(
                output,
                "- {} ({}) at {}: {:.2} LPA",
                record.full_name().trim(),
                record.registration_number.as_deref().unwrap_or("no reg. no."),
                company(record),
                record.current_package_lakhs().unwrap_or(0.0)
            );
        }
    }

    let mut recent: Vec<(NaiveDate, &StudentRecord)> = view
        .iter()
        .filter_map(|r| {
            let date = r.current_offer.as_ref()?.acceptance_date?;
            Some((date, *r))
        })
        .collect();
    recent.sort_by(|a, b| b.0.cmp(&a.0));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Acceptances");

    if recent.is_empty() {
        let _ = writeln!(output, "No accepted offers with a date in this selection.");
    } else {
        for (date, record) in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} accepted {} on {}",
                record.full_name().trim(),
                company(record),
                date
            );
        }
    }

    output
}

fn company(record: &StudentRecord) -> &str {
    record
        .current_offer
        .as_ref()
        .and_then(|o| o.company_name.as_deref())
        .unwrap_or("N/A")
}
