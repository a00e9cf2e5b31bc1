//! Entity records: students, courses, enrollments and the allow-listed student form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted last name or first/middle name.
pub const NAME_MAX_LEN: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown grade '{}'", s))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i32,
    pub last_name: String,
    pub first_mid_name: String,
    pub enrollment_date: NaiveDate,
}

/// Course ids are chosen by whoever creates the course; the store does not generate them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub course_id: i32,
    pub title: String,
    pub credits: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_id: i32,
    pub course_id: i32,
    pub student_id: i32,
    /// `None` means not graded yet, which is not the same as any letter.
    pub grade: Option<Grade>,
}

/// One enrollment joined with its course, as shown on the detail page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentDetail {
    pub enrollment_id: i32,
    pub course_id: i32,
    pub course_title: String,
    pub grade: Option<Grade>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub enrollments: Vec<EnrollmentDetail>,
}

/// Validated fields for a student that does not exist yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewStudent {
    pub last_name: String,
    pub first_mid_name: String,
    pub enrollment_date: NaiveDate,
}

/// A single modified column of a persisted student. The identity has no variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudentChange {
    LastName(String),
    FirstMidName(String),
    EnrollmentDate(NaiveDate),
}

impl StudentChange {
    pub fn column(&self) -> &'static str {
        match self {
            StudentChange::LastName(_) => "last_name",
            StudentChange::FirstMidName(_) => "first_mid_name",
            StudentChange::EnrollmentDate(_) => "enrollment_date",
        }
    }

    pub fn apply(&self, student: &mut Student) {
        match self {
            StudentChange::LastName(v) => student.last_name = v.clone(),
            StudentChange::FirstMidName(v) => student.first_mid_name = v.clone(),
            StudentChange::EnrollmentDate(d) => student.enrollment_date = *d,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// `None` for errors about the whole form.
    pub field: Option<&'static str>,
    pub message: String,
}

impl FieldError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn form(message: impl Into<String>) -> Self {
        FieldError {
            field: None,
            message: message.into(),
        }
    }
}

/// Student input accepted from clients. Only these three members are ever bound;
/// anything else in the payload (an `id`, enrollments) is dropped by deserialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub first_mid_name: Option<String>,
    #[serde(default)]
    pub enrollment_date: Option<String>,
}

impl StudentForm {
    /// Validate a create request. All three fields are required.
    pub fn validate(&self) -> Result<NewStudent, Vec<FieldError>> {
        let mut errors = Vec::new();
        let last_name = required_name("last_name", "Last name", self.last_name.as_deref(), &mut errors);
        let first_mid_name =
            required_name("first_mid_name", "First name", self.first_mid_name.as_deref(), &mut errors);
        let enrollment_date = match self.enrollment_date.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::field("enrollment_date", "Enrollment date is required."));
                None
            }
            Some(raw) => parse_date(raw)
                .map_err(|e| errors.push(e))
                .ok(),
        };
        match (last_name, first_mid_name, enrollment_date) {
            (Some(last_name), Some(first_mid_name), Some(enrollment_date)) if errors.is_empty() => Ok(NewStudent {
                last_name,
                first_mid_name,
                enrollment_date,
            }),
            _ => Err(errors),
        }
    }

    /// Copy the allow-listed members present in this form onto `student`.
    /// Absent members keep the persisted value; the identity is never written.
    /// The resulting student must still satisfy the create rules.
    pub fn apply_to(&self, student: &mut Student) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(v) = &self.last_name {
            student.last_name = v.clone();
        }
        if let Some(v) = &self.first_mid_name {
            student.first_mid_name = v.clone();
        }
        if let Some(raw) = &self.enrollment_date {
            match parse_date(raw.trim()) {
                Ok(d) => student.enrollment_date = d,
                Err(e) => errors.push(e),
            }
        }
        required_name("last_name", "Last name", Some(&student.last_name), &mut errors);
        required_name("first_mid_name", "First name", Some(&student.first_mid_name), &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<&Student> for StudentForm {
    fn from(s: &Student) -> Self {
        StudentForm {
            last_name: Some(s.last_name.clone()),
            first_mid_name: Some(s.first_mid_name.clone()),
            enrollment_date: Some(s.enrollment_date.format("%Y-%m-%d").to_string()),
        }
    }
}

fn required_name(
    field: &'static str,
    label: &str,
    value: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            errors.push(FieldError::field(field, format!("{} is required.", label)));
            return None;
        }
    };
    if value.chars().count() > NAME_MAX_LEN {
        errors.push(FieldError::field(
            field,
            format!("{} cannot be longer than {} characters.", label, NAME_MAX_LEN),
        ));
        return None;
    }
    Some(value.to_string())
}

/// Accepts ISO dates and the dd/MM/yyyy display format.
pub fn parse_date(raw: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| FieldError::field("enrollment_date", format!("The value '{}' is not a valid date.", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(last: Option<&str>, first: Option<&str>, date: Option<&str>) -> StudentForm {
        StudentForm {
            last_name: last.map(String::from),
            first_mid_name: first.map(String::from),
            enrollment_date: date.map(String::from),
        }
    }

    fn student() -> Student {
        Student {
            id: 4,
            last_name: "Barzdukas".into(),
            first_mid_name: "Gytis".into(),
            enrollment_date: NaiveDate::from_ymd_opt(2002, 9, 1).unwrap(),
        }
    }

    #[test]
    fn valid_form_produces_new_student() {
        let s = form(Some("Li"), Some("Yan"), Some("2002-09-01")).validate().unwrap();
        assert_eq!(s.last_name, "Li");
        assert_eq!(s.enrollment_date, NaiveDate::from_ymd_opt(2002, 9, 1).unwrap());
    }

    #[test]
    fn display_format_date_is_accepted() {
        let s = form(Some("Li"), Some("Yan"), Some("01/09/2002")).validate().unwrap();
        assert_eq!(s.enrollment_date, NaiveDate::from_ymd_opt(2002, 9, 1).unwrap());
    }

    #[test]
    fn every_missing_field_is_reported() {
        let errors = form(None, Some("  "), None).validate().unwrap_err();
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field).collect();
        assert_eq!(fields, vec!["last_name", "first_mid_name", "enrollment_date"]);
    }

    #[test]
    fn long_names_are_rejected() {
        let long = "x".repeat(NAME_MAX_LEN + 1);
        let errors = form(Some(&long), Some("Yan"), Some("2002-09-01")).validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Some("last_name"));
    }

    #[test]
    fn identity_is_not_bindable() {
        let parsed: StudentForm = serde_json::from_value(serde_json::json!({
            "id": 99,
            "last_name": "Li",
            "enrollments": [{"course_id": 1050}]
        }))
        .unwrap();
        assert_eq!(parsed, form(Some("Li"), None, None));
    }

    #[test]
    fn apply_keeps_absent_members() {
        let mut s = student();
        form(None, Some("Gytis Jr"), None).apply_to(&mut s).unwrap();
        assert_eq!(s.last_name, "Barzdukas");
        assert_eq!(s.first_mid_name, "Gytis Jr");
        assert_eq!(s.id, 4);
    }

    #[test]
    fn apply_rejects_blanking_a_name() {
        let mut s = student();
        let errors = form(Some(""), None, Some("not a date")).apply_to(&mut s).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn grade_parses_only_known_letters() {
        assert_eq!("B".parse::<Grade>().unwrap(), Grade::B);
        assert!("E".parse::<Grade>().is_err());
        assert!("".parse::<Grade>().is_err());
    }
}
