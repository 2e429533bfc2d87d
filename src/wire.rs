use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Offer, PlacementStatus, StudentId, StudentRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    fn text(&self) -> Option<String> {
        let value = match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }

    fn number(&self) -> Result<Option<f64>, String> {
        match self {
            Scalar::Number(n) if n.is_finite() => Ok(Some(*n)),
            Scalar::Number(n) => Err(format!("non-finite number {n}")),
            Scalar::Text(s) if s.trim().is_empty() => Ok(None),
            Scalar::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                Ok(_) => Err(format!("'{s}' is not a finite number")),
                Err(_) => Err(format!("'{s}' is not a number")),
            },
            Scalar::Bool(b) => Err(format!("expected a number, got {b}")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOffer {
    #[serde(alias = "companyName", alias = "company")]
    pub company_name: Option<Scalar>,
    #[serde(alias = "ctc", alias = "salary")]
    pub package: Option<Scalar>,
    #[serde(alias = "acceptanceDate")]
    pub acceptance_date: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStudent {
    #[serde(alias = "_id")]
    pub id: Option<Scalar>,
    #[serde(alias = "firstName")]
    pub first_name: Option<Scalar>,
    #[serde(alias = "lastName")]
    pub last_name: Option<Scalar>,
    #[serde(alias = "registrationNumber")]
    pub registration_number: Option<Scalar>,
    #[serde(alias = "collegeEmail")]
    pub college_email: Option<Scalar>,
    #[serde(alias = "personalEmail")]
    pub personal_email: Option<Scalar>,
    #[serde(alias = "phoneNumber", alias = "phone_number")]
    pub phone: Option<Scalar>,
    pub department: Option<Scalar>,
    pub branch: Option<Scalar>,
    #[serde(alias = "batchYear", alias = "batch")]
    pub batch_year: Option<Scalar>,
    #[serde(alias = "currentSemester")]
    pub current_semester: Option<Scalar>,
    pub cgpa: Option<Scalar>,
    pub backlogs: Option<Scalar>,
    #[serde(alias = "tenthPercentage")]
    pub tenth_percentage: Option<Scalar>,
    #[serde(alias = "twelfthPercentage")]
    pub twelfth_percentage: Option<Scalar>,
    #[serde(alias = "placementStatus")]
    pub placement_status: Option<Scalar>,
    #[serde(alias = "currentOffer")]
    pub current_offer: Option<RawOffer>,
    #[serde(alias = "offersReceived")]
    pub offers_received: Option<Vec<RawOffer>>,
}

/// `GET /students` answers either with a bare array or with the array wrapped
/// in an envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StudentsPayload {
    List(Vec<RawStudent>),
    Wrapped {
        #[serde(alias = "data")]
        students: Vec<RawStudent>,
    },
}

impl StudentsPayload {
    pub fn into_raw(self) -> Vec<RawStudent> {
        match self {
            StudentsPayload::List(students) => students,
            StudentsPayload::Wrapped { students } => students,
        }
    }
}

/// `POST`/`PUT` answer with the persisted record, bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StudentPayload {
    Wrapped {
        #[serde(alias = "data")]
        student: RawStudent,
    },
    Bare(RawStudent),
}

impl StudentPayload {
    pub fn into_raw(self) -> RawStudent {
        match self {
            StudentPayload::Wrapped { student } => student,
            StudentPayload::Bare(student) => student,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationIssue {
    pub student: Option<String>,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Normalized {
    pub records: Vec<StudentRecord>,
    pub issues: Vec<NormalizationIssue>,
    pub rejected: usize,
}

pub fn normalize_all(raw: Vec<RawStudent>) -> Normalized {
    let mut out = Normalized::default();
    for student in raw {
        let mut issues = Vec::new();
        match normalize(student, &mut issues) {
            Some(record) => {
                for violation in record.invariant_violations() {
                    tracing::warn!(student = %record.id, "{violation}");
                }
                out.records.push(record);
            }
            None => out.rejected += 1,
        }
        for issue in &issues {
            tracing::warn!(
                student = issue.student.as_deref().unwrap_or("<no id>"),
                field = issue.field,
                "{}",
                issue.message
            );
        }
        out.issues.extend(issues);
    }
    out
}

pub fn normalize(raw: RawStudent, issues: &mut Vec<NormalizationIssue>) -> Option<StudentRecord> {
    let Some(id) = raw.id.as_ref().and_then(Scalar::text) else {
        issues.push(NormalizationIssue {
            student: None,
            field: "id",
            message: "record has no id and was skipped".to_string(),
        });
        return None;
    };

    let mut fields = FieldReader {
        student: id.clone(),
        issues,
    };

    let placement_status = fields.status(raw.placement_status.as_ref());
    let current_offer = raw.current_offer.as_ref().map(|offer| fields.offer(offer));
    let offers_received = raw
        .offers_received
        .unwrap_or_default()
        .iter()
        .map(|offer| fields.offer(offer))
        .collect();

    Some(StudentRecord {
        id: StudentId(id),
        first_name: text(&raw.first_name),
        last_name: text(&raw.last_name),
        registration_number: text(&raw.registration_number),
        college_email: text(&raw.college_email),
        personal_email: text(&raw.personal_email),
        phone: text(&raw.phone),
        department: text(&raw.department),
        branch: text(&raw.branch),
        batch_year: fields.integer("batch_year", &raw.batch_year),
        current_semester: fields.integer("current_semester", &raw.current_semester),
        cgpa: fields.number("cgpa", &raw.cgpa),
        backlogs: fields.integer("backlogs", &raw.backlogs),
        tenth_percentage: fields.number("tenth_percentage", &raw.tenth_percentage),
        twelfth_percentage: fields.number("twelfth_percentage", &raw.twelfth_percentage),
        placement_status,
        current_offer,
        offers_received,
    })
}

fn text(value: &Option<Scalar>) -> Option<String> {
    value.as_ref().and_then(Scalar::text)
}

struct FieldReader<'a> {
    student: String,
    issues: &'a mut Vec<NormalizationIssue>,
}

impl FieldReader<'_> {
    fn flag(&mut self, field: &'static str, message: String) {
        self.issues.push(NormalizationIssue {
            student: Some(self.student.clone()),
            field,
            message,
        });
    }

    fn number(&mut self, field: &'static str, value: &Option<Scalar>) -> Option<f64> {
        match value.as_ref().map(Scalar::number) {
            None => None,
            Some(Ok(number)) => number,
            Some(Err(message)) => {
                self.flag(field, message);
                None
            }
        }
    }

    fn integer<T: TryFrom<i64>>(&mut self, field: &'static str, value: &Option<Scalar>) -> Option<T> {
        let number = self.number(field, value)?;
        if number.fract() != 0.0 {
            self.flag(field, format!("{number} is not a whole number"));
            return None;
        }
        match T::try_from(number as i64) {
            Ok(value) => Some(value),
            Err(_) => {
                self.flag(field, format!("{number} is out of range"));
                None
            }
        }
    }

    fn status(&mut self, value: Option<&Scalar>) -> PlacementStatus {
        let Some(tag) = value.and_then(Scalar::text) else {
            return PlacementStatus::Unplaced;
        };
        match tag.parse() {
            Ok(status) => status,
            Err(err) => {
                self.flag("placement_status", format!("{err}, treated as unplaced"));
                PlacementStatus::Unplaced
            }
        }
    }

    fn date(&mut self, value: &Option<Scalar>) -> Option<NaiveDate> {
        let raw = text(value)?;
        // Accepts plain dates and ISO timestamps.
        let day = raw.get(..10).unwrap_or(&raw);
        match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.flag("acceptance_date", format!("'{raw}' is not a date"));
                None
            }
        }
    }

    fn offer(&mut self, raw: &RawOffer) -> Offer {
        Offer {
            company_name: text(&raw.company_name),
            package: self.number("package", &raw.package),
            acceptance_date: self.date(&raw.acceptance_date),
        }
    }
}

/// Body of `POST /students`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    pub college_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenth_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twelfth_percentage: Option<f64>,
    pub placement_status: PlacementStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_offer: Option<OfferBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferBody {
    pub company_name: String,
    pub package: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_date: Option<NaiveDate>,
}

/// Body of `PUT /students/{id}` for a placement update. A `None` offer is
/// sent as `null` so the backend drops any stale offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
    pub placement_status: PlacementStatus,
    pub current_offer: Option<OfferBody>,
}
