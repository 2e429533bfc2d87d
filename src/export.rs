use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::models::StudentRecord;

const MISSING: &str = "N/A";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unknown export column '{0}'")]
    UnknownColumn(String),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV output was not valid UTF-8")]
    Utf8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportColumn {
    FirstName,
    LastName,
    FullName,
    RegistrationNumber,
    CollegeEmail,
    PersonalEmail,
    Phone,
    Department,
    Branch,
    BatchYear,
    CurrentSemester,
    Cgpa,
    Backlogs,
    TenthPercentage,
    TwelfthPercentage,
    PlacementStatus,
    CurrentCompany,
    CurrentPackage,
    AcceptanceDate,
    TotalOffers,
}

impl ExportColumn {
    pub const ALL: [ExportColumn; 20] = [
        ExportColumn::FirstName,
        ExportColumn::LastName,
        ExportColumn::FullName,
        ExportColumn::RegistrationNumber,
        ExportColumn::CollegeEmail,
        ExportColumn::PersonalEmail,
        ExportColumn::Phone,
        ExportColumn::Department,
        ExportColumn::Branch,
        ExportColumn::BatchYear,
        ExportColumn::CurrentSemester,
        ExportColumn::Cgpa,
        ExportColumn::Backlogs,
        ExportColumn::TenthPercentage,
        ExportColumn::TwelfthPercentage,
        ExportColumn::PlacementStatus,
        ExportColumn::CurrentCompany,
        ExportColumn::CurrentPackage,
        ExportColumn::AcceptanceDate,
        ExportColumn::TotalOffers,
    ];

    pub const DEFAULT: [ExportColumn; 10] = [
        ExportColumn::FullName,
        ExportColumn::RegistrationNumber,
        ExportColumn::CollegeEmail,
        ExportColumn::Branch,
        ExportColumn::BatchYear,
        ExportColumn::Cgpa,
        ExportColumn::PlacementStatus,
        ExportColumn::CurrentCompany,
        ExportColumn::CurrentPackage,
        ExportColumn::TotalOffers,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ExportColumn::FirstName => "first_name",
            ExportColumn::LastName => "last_name",
            ExportColumn::FullName => "full_name",
            ExportColumn::RegistrationNumber => "registration_number",
            ExportColumn::CollegeEmail => "college_email",
            ExportColumn::PersonalEmail => "personal_email",
            ExportColumn::Phone => "phone",
            ExportColumn::Department => "department",
            ExportColumn::Branch => "branch",
            ExportColumn::BatchYear => "batch_year",
            ExportColumn::CurrentSemester => "current_semester",
            ExportColumn::Cgpa => "cgpa",
            ExportColumn::Backlogs => "backlogs",
            ExportColumn::TenthPercentage => "tenth_percentage",
            ExportColumn::TwelfthPercentage => "twelfth_percentage",
            ExportColumn::PlacementStatus => "placement_status",
            ExportColumn::CurrentCompany => "current_company",
            ExportColumn::CurrentPackage => "current_package",
            ExportColumn::AcceptanceDate => "acceptance_date",
            ExportColumn::TotalOffers => "total_offers",
        }
    }

    fn render(self, record: &StudentRecord) -> String {
        let offer = record.current_offer.as_ref();
        match self {
            ExportColumn::FirstName => text(&record.first_name),
            ExportColumn::LastName => text(&record.last_name),
            ExportColumn::FullName => record.full_name().trim().to_string(),
            ExportColumn::RegistrationNumber => text(&record.registration_number),
            ExportColumn::CollegeEmail => text(&record.college_email),
            ExportColumn::PersonalEmail => text(&record.personal_email),
            ExportColumn::Phone => text(&record.phone),
            ExportColumn::Department => text(&record.department),
            ExportColumn::Branch => text(&record.branch),
            ExportColumn::BatchYear => display(record.batch_year),
            ExportColumn::CurrentSemester => display(record.current_semester),
            ExportColumn::Cgpa => fixed(record.cgpa),
            ExportColumn::Backlogs => display(record.backlogs),
            ExportColumn::TenthPercentage => fixed(record.tenth_percentage),
            ExportColumn::TwelfthPercentage => fixed(record.twelfth_percentage),
            ExportColumn::PlacementStatus => record.placement_status.to_string(),
            ExportColumn::CurrentCompany => text(&offer.and_then(|o| o.company_name.clone())),
            ExportColumn::CurrentPackage => fixed(record.current_package_lakhs()),
            ExportColumn::AcceptanceDate => display(offer.and_then(|o| o.acceptance_date)),
            ExportColumn::TotalOffers => record.offers_received.len().to_string(),
        }
    }
}

impl fmt::Display for ExportColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ExportColumn {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim();
        ExportColumn::ALL
            .into_iter()
            .find(|column| column.key() == key)
            .ok_or_else(|| ExportError::UnknownColumn(key.to_string()))
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING.to_string())
}

fn display<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn fixed(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.2}"))
}

/// Parses a comma separated selection, dropping repeats.
pub fn parse_columns(selection: &str) -> Result<Vec<ExportColumn>, ExportError> {
    let mut columns = Vec::new();
    for part in selection.split(',').filter(|p| !p.trim().is_empty()) {
        let column: ExportColumn = part.parse()?;
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    Ok(columns)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    cells: Vec<(ExportColumn, String)>,
}

impl ExportRow {
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(column, _)| column.key() == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, value)| value.as_str())
    }
}

pub fn export_rows(records: &[&StudentRecord], columns: &[ExportColumn]) -> Vec<ExportRow> {
    records
        .iter()
        .map(|record| ExportRow {
            cells: columns
                .iter()
                .map(|column| (*column, column.render(record)))
                .collect(),
        })
        .collect()
}

pub fn write_csv<W: Write>(
    writer: W,
    columns: &[ExportColumn],
    rows: &[ExportRow],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(columns.iter().map(|c| c.key()))?;
    for row in rows {
        csv_writer.write_record(row.values())?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(columns: &[ExportColumn], rows: &[ExportRow]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, columns, rows)?;
    String::from_utf8(buffer).map_err(|_| ExportError::Utf8)
}
