use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::PlacementStatus;
use crate::wire::{NewStudent, OfferBody};

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern compiles");
}

pub const PHONE_DIGITS: usize = 10;
pub const RESET_CODE_DIGITS: usize = 6;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Per-field problems found before anything is sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

/// Returns the bare 10-digit number, or `None` when the input does not hold
/// one. Spaces, dashes and a leading `+91` are tolerated.
pub fn normalize_phone(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '+')))
    {
        return None;
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    let digits = if trimmed.starts_with('+') {
        digits.strip_prefix("91")?.to_string()
    } else {
        digits
    };
    (digits.len() == PHONE_DIGITS).then_some(digits)
}

pub fn validate_student(student: &NewStudent) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if student.first_name.trim().is_empty() {
        errors.push("first_name", "is required");
    }
    if student.last_name.trim().is_empty() {
        errors.push("last_name", "is required");
    }
    if !is_valid_email(&student.college_email) {
        errors.push("college_email", "must be a valid email address");
    }
    if let Some(email) = &student.personal_email {
        if !is_valid_email(email) {
            errors.push("personal_email", "must be a valid email address");
        }
    }
    if let Some(phone) = &student.phone {
        if normalize_phone(phone).is_none() {
            errors.push("phone", format!("must contain exactly {PHONE_DIGITS} digits"));
        }
    }
    if let Some(cgpa) = student.cgpa {
        if !(0.0..=10.0).contains(&cgpa) {
            errors.push("cgpa", "must be between 0 and 10");
        }
    }
    for (field, value) in [
        ("tenth_percentage", student.tenth_percentage),
        ("twelfth_percentage", student.twelfth_percentage),
    ] {
        if let Some(value) = value {
            if !(0.0..=100.0).contains(&value) {
                errors.push(field, "must be between 0 and 100");
            }
        }
    }
    if student.placement_status == PlacementStatus::Placed {
        check_offer(&mut errors, student.current_offer.as_ref());
    }

    errors.into_result()
}

pub fn validate_placement_update(
    status: PlacementStatus,
    company: Option<&str>,
    package: Option<f64>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if status == PlacementStatus::Placed {
        if company.map_or(true, |c| c.trim().is_empty()) {
            errors.push("company", "is required for placed students");
        }
        if !package.map_or(false, |p| p > 0.0) {
            errors.push("package", "must be a positive amount for placed students");
        }
    } else if company.is_some() != package.is_some() {
        errors.push("offer", "company and package must be given together");
    }
    errors.into_result()
}

fn check_offer(errors: &mut ValidationErrors, offer: Option<&OfferBody>) {
    match offer {
        None => errors.push("current_offer", "is required for placed students"),
        Some(offer) => {
            if offer.company_name.trim().is_empty() {
                errors.push("company", "is required for placed students");
            }
            if offer.package <= 0.0 {
                errors.push("package", "must be a positive amount for placed students");
            }
        }
    }
}

pub fn validate_reset_code(code: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let code = code.trim();
    if code.len() != RESET_CODE_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
        errors.push("code", format!("must be {RESET_CODE_DIGITS} digits"));
    }
    errors.into_result()
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    if password != confirmation {
        errors.push("confirm_password", "does not match");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_student() -> NewStudent {
        NewStudent {
            first_name: "Avery".to_string(),
            last_name: "Lee".to_string(),
            college_email: "avery.lee@college.edu".to_string(),
            ..NewStudent::default()
        }
    }

    #[test]
    fn accepts_a_minimal_student() {
        assert_eq!(validate_student(&valid_student()), Ok(()));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a.b+tag@mail.college.edu"));
        assert!(!is_valid_email("avery@college"));
        assert!(!is_valid_email("avery college.edu"));
        assert!(!is_valid_email("@college.edu"));
    }

    #[test]
    fn phone_needs_ten_digits() {
        assert_eq!(normalize_phone("98765 43210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_phone("+91-98765-43210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_phone("987654321"), None);
        assert_eq!(normalize_phone("98765432101"), None);
        assert_eq!(normalize_phone("98765x4321"), None);
    }

    #[test]
    fn collects_every_field_problem() {
        let student = NewStudent {
            first_name: " ".to_string(),
            college_email: "nope".to_string(),
            phone: Some("12345".to_string()),
            cgpa: Some(11.0),
            twelfth_percentage: Some(101.0),
            ..valid_student()
        };
        let errors = validate_student(&student).unwrap_err();
        assert_eq!(
            errors.fields(),
            vec!["first_name", "college_email", "phone", "cgpa", "twelfth_percentage"]
        );
    }

    #[test]
    fn placed_students_need_an_offer() {
        let mut student = valid_student();
        student.placement_status = PlacementStatus::Placed;
        assert_eq!(validate_student(&student).unwrap_err().fields(), vec!["current_offer"]);

        student.current_offer = Some(OfferBody {
            company_name: "Acme".to_string(),
            package: 900_000.0,
            acceptance_date: None,
        });
        assert_eq!(validate_student(&student), Ok(()));
    }

    #[test]
    fn placement_update_rules() {
        assert!(validate_placement_update(PlacementStatus::Unplaced, None, None).is_ok());
        let errors =
            validate_placement_update(PlacementStatus::Placed, Some(""), Some(0.0)).unwrap_err();
        assert_eq!(errors.fields(), vec!["company", "package"]);
        assert!(validate_placement_update(PlacementStatus::Placed, Some("Acme"), Some(1.0)).is_ok());
    }

    #[test]
    fn half_an_offer_is_rejected_for_other_statuses() {
        let errors = validate_placement_update(PlacementStatus::HigherStudies, Some("Acme"), None)
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["offer"]);
        assert!(
            validate_placement_update(PlacementStatus::Entrepreneurship, None, Some(5.0)).is_err()
        );
        assert!(
            validate_placement_update(PlacementStatus::HigherStudies, Some("Acme"), Some(5.0))
                .is_ok()
        );
    }

    #[test]
    fn reset_inputs() {
        assert!(validate_reset_code("123456").is_ok());
        assert!(validate_reset_code("12345a").is_err());
        assert!(validate_new_password("hunter22", "hunter22").is_ok());
        assert_eq!(
            validate_new_password("short", "other").unwrap_err().fields(),
            vec!["password", "confirm_password"]
        );
    }
}
