//! Certificate request validation
//!
//! Both HTTP surfaces collect loosely-typed input (HTML form fields,
//! JSON object values) into a [`CertificateRequestInput`]; validation
//! turns it into a [`CertificateRequest`] or a field-tagged
//! [`ValidationErrors`] map, so error responses stay keyed per field.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Allowed certificate validity range, in days.
pub const MIN_EXPIRATION_DAYS: i64 = 1;
pub const MAX_EXPIRATION_DAYS: i64 = 365;

pub(crate) const MSG_REQUIRED: &str = "This field is required.";
pub(crate) const MSG_INTEGER: &str = "A valid integer is required.";
pub(crate) const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub(crate) const MSG_EXPIRATION_RANGE: &str = "Expiration must be between 1 and 365 days.";
pub(crate) const MSG_COUNTRY_CODE: &str = "Country code must be two letters (ISO 3166-1 alpha-2).";

/// Validation failures keyed by field name, each carrying one or more
/// messages. Serializes to the `{"field": ["message", ...]}` shape the
/// API returns with HTTP 400.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors(pub BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into `(field, message)` pairs for inline page notifications.
    pub fn iter_messages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| (field.as_str(), m.as_str())))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter_messages() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// The `expiration` field as it arrives off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationInput {
    /// Parsed integer value (range still unchecked)
    Value(i64),
    /// Present but not an integer
    Invalid,
}

/// Loosely-typed certificate request, prior to validation. `None` means
/// the field was absent from the submission.
#[derive(Debug, Clone, Default)]
pub struct CertificateRequestInput {
    pub filename: Option<String>,
    pub expiration: Option<ExpirationInput>,
    pub password: Option<String>,
    pub password2: Option<String>,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub organization: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_code: Option<String>,
}

/// A fully validated certificate request, ready for the builder.
/// Passwords are write-only: they reach the PKCS#12 encryption step and
/// nothing else, never persisted and never logged.
#[derive(Clone)]
pub struct CertificateRequest {
    pub filename: String,
    /// Validity in days, within 1..=365
    pub expiration: i64,
    pub password: String,
    pub full_name: String,
    pub department: String,
    pub organization: String,
    pub city: String,
    pub region: String,
    pub country_code: String,
}

impl fmt::Debug for CertificateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Manual impl so the password can never leak into logs.
        f.debug_struct("CertificateRequest")
            .field("filename", &self.filename)
            .field("expiration", &self.expiration)
            .field("full_name", &self.full_name)
            .field("department", &self.department)
            .field("organization", &self.organization)
            .field("city", &self.city)
            .field("region", &self.region)
            .field("country_code", &self.country_code)
            .finish_non_exhaustive()
    }
}

fn required(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => Some(v),
        None => {
            errors.add(field, MSG_REQUIRED);
            None
        }
    }
}

impl CertificateRequestInput {
    /// Validate every rule at once so the caller gets the complete set of
    /// field errors in a single round trip.
    pub fn validate(self) -> Result<CertificateRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let filename = required(&mut errors, "filename", self.filename);
        let password = required(&mut errors, "password", self.password);
        let password2 = required(&mut errors, "password2", self.password2);
        let full_name = required(&mut errors, "full_name", self.full_name);
        let department = required(&mut errors, "department", self.department);
        let organization = required(&mut errors, "organization", self.organization);
        let city = required(&mut errors, "city", self.city);
        let region = required(&mut errors, "region", self.region);
        let country_code = required(&mut errors, "country_code", self.country_code);

        let expiration = match self.expiration {
            None => {
                errors.add("expiration", MSG_REQUIRED);
                None
            }
            Some(ExpirationInput::Invalid) => {
                errors.add("expiration", MSG_INTEGER);
                None
            }
            Some(ExpirationInput::Value(days))
                if !(MIN_EXPIRATION_DAYS..=MAX_EXPIRATION_DAYS).contains(&days) =>
            {
                errors.add("expiration", MSG_EXPIRATION_RANGE);
                None
            }
            Some(ExpirationInput::Value(days)) => Some(days),
        };

        if let (Some(p1), Some(p2)) = (password.as_deref(), password2.as_deref()) {
            if p1 != p2 {
                errors.add("password2", MSG_PASSWORD_MISMATCH);
            }
        }

        let country_code = country_code.filter(|code| {
            if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
                true
            } else {
                errors.add("country_code", MSG_COUNTRY_CODE);
                false
            }
        });

        if !errors.is_empty() {
            return Err(errors);
        }

        // All Options are Some here; any None above produced an error.
        Ok(CertificateRequest {
            filename: filename.ok_or_else(ValidationErrors::default)?,
            expiration: expiration.ok_or_else(ValidationErrors::default)?,
            password: password.ok_or_else(ValidationErrors::default)?,
            full_name: full_name.ok_or_else(ValidationErrors::default)?,
            department: department.ok_or_else(ValidationErrors::default)?,
            organization: organization.ok_or_else(ValidationErrors::default)?,
            city: city.ok_or_else(ValidationErrors::default)?,
            region: region.ok_or_else(ValidationErrors::default)?,
            country_code: country_code.ok_or_else(ValidationErrors::default)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CertificateRequestInput {
        CertificateRequestInput {
            filename: Some("AB_test".to_string()),
            expiration: Some(ExpirationInput::Value(365)),
            password: Some("1234".to_string()),
            password2: Some("1234".to_string()),
            full_name: Some("nurs sabir".to_string()),
            department: Some("IT".to_string()),
            organization: Some("Example Org".to_string()),
            city: Some("Bishkek".to_string()),
            region: Some("Chuy".to_string()),
            country_code: Some("KG".to_string()),
        }
    }

    #[test]
    fn valid_input_passes() {
        let request = valid_input().validate().expect("input should validate");
        assert_eq!(request.filename, "AB_test");
        assert_eq!(request.expiration, 365);
        assert_eq!(request.country_code, "KG");
    }

    #[test]
    fn password_mismatch_is_tagged_password2() {
        let mut input = valid_input();
        input.password2 = Some("different".to_string());

        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors.0.get("password2"),
            Some(&vec![MSG_PASSWORD_MISMATCH.to_string()])
        );
    }

    #[test]
    fn expiration_bounds() {
        for days in [0, 366, -5] {
            let mut input = valid_input();
            input.expiration = Some(ExpirationInput::Value(days));
            let errors = input.validate().unwrap_err();
            assert!(errors.0.contains_key("expiration"), "{days} should fail");
        }

        for days in [1, 365] {
            let mut input = valid_input();
            input.expiration = Some(ExpirationInput::Value(days));
            assert!(input.validate().is_ok(), "{days} should pass");
        }
    }

    #[test]
    fn non_integer_expiration_is_a_field_error() {
        let mut input = valid_input();
        input.expiration = Some(ExpirationInput::Invalid);

        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors.0.get("expiration"),
            Some(&vec![MSG_INTEGER.to_string()])
        );
    }

    #[test]
    fn missing_fields_are_each_reported() {
        let errors = CertificateRequestInput::default().validate().unwrap_err();

        for field in [
            "filename",
            "expiration",
            "password",
            "password2",
            "full_name",
            "department",
            "organization",
            "city",
            "region",
            "country_code",
        ] {
            assert_eq!(
                errors.0.get(field),
                Some(&vec![MSG_REQUIRED.to_string()]),
                "missing {field}"
            );
        }
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let mut input = valid_input();
        input.city = Some("   ".to_string());

        let errors = input.validate().unwrap_err();
        assert!(errors.0.contains_key("city"));
    }

    #[test]
    fn country_code_must_be_two_letters() {
        for bad in ["KGZ", "K", "12", "k-"] {
            let mut input = valid_input();
            input.country_code = Some(bad.to_string());
            let errors = input.validate().unwrap_err();
            assert!(errors.0.contains_key("country_code"), "{bad} should fail");
        }

        let mut input = valid_input();
        input.country_code = Some("kg".to_string());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn debug_output_hides_password() {
        let request = valid_input().validate().unwrap();
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("1234"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let mut input = valid_input();
        input.password2 = Some("other".to_string());
        input.expiration = Some(ExpirationInput::Value(0));

        let errors = input.validate().unwrap_err();
        assert_eq!(errors.0.len(), 2);
    }
}
