use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const RUPEES_PER_LAKH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        StudentId(value.to_string())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    Placed,
    #[default]
    Unplaced,
    HigherStudies,
    Entrepreneurship,
    Debarred,
}

impl PlacementStatus {
    pub const ALL: [PlacementStatus; 5] = [
        PlacementStatus::Placed,
        PlacementStatus::Unplaced,
        PlacementStatus::HigherStudies,
        PlacementStatus::Entrepreneurship,
        PlacementStatus::Debarred,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlacementStatus::Placed => "placed",
            PlacementStatus::Unplaced => "unplaced",
            PlacementStatus::HigherStudies => "higher_studies",
            PlacementStatus::Entrepreneurship => "entrepreneurship",
            PlacementStatus::Debarred => "debarred",
        }
    }
}

impl fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown placement status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for PlacementStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tag = value.trim().to_ascii_lowercase().replace('-', "_");
        PlacementStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == tag)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Offer {
    pub company_name: Option<String>,
    /// Raw package in rupees per annum.
    pub package: Option<f64>,
    pub acceptance_date: Option<NaiveDate>,
}

impl Offer {
    pub fn package_lakhs(&self) -> Option<f64> {
        self.package.map(|raw| raw / RUPEES_PER_LAKH)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub registration_number: Option<String>,
    pub college_email: Option<String>,
    pub personal_email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub branch: Option<String>,
    pub batch_year: Option<i32>,
    pub current_semester: Option<u8>,
    pub cgpa: Option<f64>,
    pub backlogs: Option<u32>,
    pub tenth_percentage: Option<f64>,
    pub twelfth_percentage: Option<f64>,
    pub placement_status: PlacementStatus,
    pub current_offer: Option<Offer>,
    pub offers_received: Vec<Offer>,
}

impl StudentRecord {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        StudentRecord {
            id: StudentId(id.into()),
            first_name: None,
            last_name: None,
            registration_number: None,
            college_email: None,
            personal_email: None,
            phone: None,
            department: None,
            branch: None,
            batch_year: None,
            current_semester: None,
            cgpa: None,
            backlogs: None,
            tenth_percentage: None,
            twelfth_percentage: None,
            placement_status: PlacementStatus::Unplaced,
            current_offer: None,
            offers_received: Vec::new(),
        }
    }

    /// `first + " " + last`, with missing parts treated as empty.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
    }

    pub fn current_package_lakhs(&self) -> Option<f64> {
        self.current_offer.as_ref().and_then(Offer::package_lakhs)
    }

    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.placement_status == PlacementStatus::Placed && self.current_offer.is_none() {
            violations.push(format!("student {} is placed but has no current offer", self.id));
        }
        violations
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub status: Option<PlacementStatus>,
    pub branch: Option<String>,
    pub batch: Option<i32>,
    pub search: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    RegistrationNumber,
    Cgpa,
    Package,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(SortKey::Name),
            "registration_number" | "registration" | "reg" => Ok(SortKey::RegistrationNumber),
            "cgpa" => Ok(SortKey::Cgpa),
            "package" => Ok(SortKey::Package),
            other => Err(format!(
                "unknown sort key '{other}' (expected name, registration_number, cgpa, package)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PackageStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total_count: usize,
    pub count_by_status: Vec<(PlacementStatus, usize)>,
    pub package: PackageStats,
    pub placement_rate: f64,
}

impl AggregateStats {
    pub fn count_for(&self, status: PlacementStatus) -> usize {
        self.count_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchSummary {
    pub branch: String,
    pub total: usize,
    pub placed: usize,
    pub avg_package: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tags_parse_leniently() {
        assert_eq!("placed".parse::<PlacementStatus>(), Ok(PlacementStatus::Placed));
        assert_eq!(
            "Higher-Studies".parse::<PlacementStatus>(),
            Ok(PlacementStatus::HigherStudies)
        );
        assert!("not_interested".parse::<PlacementStatus>().is_err());
    }

    #[test]
    fn package_converts_to_lakhs() {
        let offer = Offer {
            company_name: Some("Acme".to_string()),
            package: Some(1_200_000.0),
            acceptance_date: None,
        };
        assert_eq!(offer.package_lakhs(), Some(12.0));
    }

    #[test]
    fn placed_without_offer_is_flagged() {
        let mut record = StudentRecord::new("s1");
        record.placement_status = PlacementStatus::Placed;
        assert_eq!(record.invariant_violations().len(), 1);

        record.current_offer = Some(Offer::default());
        assert!(record.invariant_violations().is_empty());
    }

    #[test]
    fn full_name_tolerates_missing_parts() {
        let mut record = StudentRecord::new("s1");
        record.first_name = Some("Avery".to_string());
        assert_eq!(record.full_name(), "Avery ");
    }
}
