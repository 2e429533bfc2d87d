use std::fmt::Display;
use std::future::Future;
use std::io::Read;

use anyhow::Context;
use chrono::NaiveDate;

use crate::models::{PlacementStatus, StudentRecord, UnknownStatus};
use crate::validate::{self, ValidationErrors};
use crate::wire::{NewStudent, OfferBody};

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    first_name: String,
    last_name: String,
    college_email: String,
    registration_number: Option<String>,
    personal_email: Option<String>,
    phone: Option<String>,
    department: Option<String>,
    branch: Option<String>,
    batch_year: Option<i32>,
    cgpa: Option<f64>,
    tenth_percentage: Option<f64>,
    twelfth_percentage: Option<f64>,
    placement_status: Option<String>,
    company_name: Option<String>,
    package: Option<f64>,
    acceptance_date: Option<NaiveDate>,
}

#[derive(Debug)]
pub struct RejectedRow {
    /// 1-based data line, header excluded.
    pub line: usize,
    pub errors: ValidationErrors,
}

#[derive(Debug)]
pub struct ImportRow {
    pub line: usize,
    pub student: NewStudent,
}

#[derive(Debug, Default)]
pub struct ImportBatch {
    pub students: Vec<ImportRow>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug)]
pub struct FailedRow {
    pub line: usize,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub created: Vec<StudentRecord>,
    pub failed: Vec<FailedRow>,
}

/// Parses and validates an import file. Rows that fail validation are kept
/// aside; malformed CSV is an error for the whole file.
pub fn read_students<R: Read>(reader: R) -> anyhow::Result<ImportBatch> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut batch = ImportBatch::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 1;
        let row = result.with_context(|| format!("malformed CSV row {line}"))?;
        let student = match into_new_student(row) {
            Ok(student) => student,
            Err(errors) => {
                batch.rejected.push(RejectedRow { line, errors });
                continue;
            }
        };
        match validate::validate_student(&student) {
            Ok(()) => batch.students.push(ImportRow { line, student }),
            Err(errors) => batch.rejected.push(RejectedRow { line, errors }),
        }
    }

    Ok(batch)
}

/// Creates every row in order. A failed create is recorded against its line
/// and the remaining rows are still sent.
pub async fn create_all<F, Fut, E>(rows: &[ImportRow], mut create: F) -> ImportOutcome
where
    F: FnMut(NewStudent) -> Fut,
    Fut: Future<Output = Result<StudentRecord, E>>,
    E: Display,
{
    let mut outcome = ImportOutcome::default();
    for row in rows {
        match create(row.student.clone()).await {
            Ok(record) => {
                tracing::info!(line = row.line, student = %record.id, "student created");
                outcome.created.push(record);
            }
            Err(err) => {
                tracing::warn!(line = row.line, "create failed: {err}");
                outcome.failed.push(FailedRow {
                    line: row.line,
                    error: err.to_string(),
                });
            }
        }
    }
    outcome
}

fn into_new_student(row: CsvRow) -> Result<NewStudent, ValidationErrors> {
    let placement_status = match non_empty(row.placement_status) {
        None => PlacementStatus::Unplaced,
        Some(tag) => tag
            .parse::<PlacementStatus>()
            .map_err(|err: UnknownStatus| ValidationErrors {
                errors: vec![validate::FieldError {
                    field: "placement_status",
                    message: err.to_string(),
                }],
            })?,
    };

    let current_offer = match (non_empty(row.company_name), row.package) {
        (Some(company_name), Some(package)) => Some(OfferBody {
            company_name,
            package,
            acceptance_date: row.acceptance_date,
        }),
        _ => None,
    };

    Ok(NewStudent {
        first_name: row.first_name,
        last_name: row.last_name,
        registration_number: non_empty(row.registration_number),
        college_email: row.college_email,
        personal_email: non_empty(row.personal_email),
        phone: non_empty(row.phone).map(|p| validate::normalize_phone(&p).unwrap_or(p)),
        department: non_empty(row.department),
        branch: non_empty(row.branch),
        batch_year: row.batch_year,
        cgpa: row.cgpa,
        tenth_percentage: row.tenth_percentage,
        twelfth_percentage: row.twelfth_percentage,
        placement_status,
        current_offer,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "first_name,last_name,college_email,registration_number,personal_email,phone,department,branch,batch_year,cgpa,tenth_percentage,twelfth_percentage,placement_status,company_name,package,acceptance_date";

    fn read(rows: &[&str]) -> ImportBatch {
        let mut input = String::from(HEADER);
        for row in rows {
            input.push('\n');
            input.push_str(row);
        }
        read_students(input.as_bytes()).unwrap()
    }

    #[test]
    fn valid_rows_become_new_students() {
        let batch = read(&[
            "Avery,Lee,avery@college.edu,21BCE1001,,98765 43210,Engineering,CSE,2025,8.4,92,88,placed,\"Acme, Inc.\",1200000,2025-03-01",
            "Jules,Moreno,jules@college.edu,,,,,,2025,,,,,,,",
        ]);
        assert!(batch.rejected.is_empty());
        assert_eq!(batch.students.len(), 2);

        let avery = &batch.students[0].student;
        assert_eq!(avery.phone.as_deref(), Some("9876543210"));
        assert_eq!(avery.placement_status, PlacementStatus::Placed);
        let offer = avery.current_offer.as_ref().unwrap();
        assert_eq!(offer.company_name, "Acme, Inc.");
        assert_eq!(offer.acceptance_date, NaiveDate::from_ymd_opt(2025, 3, 1));

        assert_eq!(batch.students[1].line, 2);
        let jules = &batch.students[1].student;
        assert_eq!(jules.placement_status, PlacementStatus::Unplaced);
        assert_eq!(jules.branch, None);
        assert_eq!(jules.current_offer, None);
    }

    #[test]
    fn invalid_rows_are_set_aside_with_line_numbers() {
        let batch = read(&[
            "Avery,Lee,avery@college.edu,,,,,,,,,,,,,",
            "Jules,Moreno,not-an-email,,,123,,,,,,,,,,",
            "Kiara,Patel,kiara@college.edu,,,,,,,,,,not_interested,,,",
        ]);
        assert_eq!(batch.students.len(), 1);
        assert_eq!(batch.rejected.len(), 2);
        assert_eq!(batch.rejected[0].line, 2);
        assert_eq!(batch.rejected[0].errors.fields(), vec!["college_email", "phone"]);
        assert_eq!(batch.rejected[1].line, 3);
        assert_eq!(batch.rejected[1].errors.fields(), vec!["placement_status"]);
    }

    #[test]
    fn malformed_numbers_fail_the_file() {
        let input = format!("{HEADER}\nAvery,Lee,avery@college.edu,,,,,,twenty,,,,,,,");
        assert!(read_students(input.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn failed_creates_do_not_stop_the_import() {
        let batch = read(&[
            "Avery,Lee,avery@college.edu,,,,,,,,,,,,,",
            "Jules,Moreno,jules@college.edu,,,,,,,,,,,,,",
            "Kiara,Patel,kiara@college.edu,,,,,,,,,,,,,",
        ]);
        let mut attempts = Vec::new();

        let outcome = create_all(&batch.students, |student| {
            attempts.push(student.first_name.clone());
            async move {
                if student.first_name == "Jules" {
                    Err("backend answered 500: duplicate email")
                } else {
                    let id = format!("id-{}", student.first_name.to_lowercase());
                    Ok(crate::testing::student(&id, &student.first_name, &student.last_name))
                }
            }
        })
        .await;

        assert_eq!(attempts, vec!["Avery", "Jules", "Kiara"]);
        let created: Vec<&StudentRecord> = outcome.created.iter().collect();
        assert_eq!(crate::testing::ids(&created), vec!["id-avery", "id-kiara"]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].line, 2);
        assert_eq!(outcome.failed[0].error, "backend answered 500: duplicate email");
    }
}
