//! Registration form values and the validation schema shared by the
//! command-line collector and the HTTP endpoint.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::{Country, Gender, Registration};

const FULL_NAME_MIN_CHARS: usize = 2;
const FULL_NAME_MAX_CHARS: usize = 50;
const PASSWORD_MIN_CHARS: usize = 8;

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    )
    .expect("email pattern must compile");
}

/// Raw field values as entered by the user. `Default` gives the initial,
/// empty form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub gender: String,
    pub subscription: bool,
    pub country: String,
    pub terms: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    Email,
    Password,
    ConfirmPassword,
    Gender,
    Country,
    Terms,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::Gender => "gender",
            Self::Country => "country",
            Self::Terms => "terms",
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Field name to the first rule that field failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FormErrors(BTreeMap<Field, String>);

impl FormErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.entry(field).or_insert_with(|| message.to_string());
    }
}

impl RegistrationForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn validate(&self) -> Result<Registration, FormErrors> {
        let mut errors = FormErrors::default();

        let full_name_chars = self.full_name.chars().count();
        if self.full_name.is_empty() {
            errors.insert(Field::FullName, "Full name is required");
        } else if full_name_chars < FULL_NAME_MIN_CHARS {
            errors.insert(Field::FullName, "Full name is too short");
        } else if full_name_chars > FULL_NAME_MAX_CHARS {
            errors.insert(Field::FullName, "Full name is too long");
        }

        if self.email.is_empty() {
            errors.insert(Field::Email, "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.insert(Field::Email, "Invalid email address");
        }

        if self.password.is_empty() {
            errors.insert(Field::Password, "Password is required");
        } else if self.password.chars().count() < PASSWORD_MIN_CHARS {
            errors.insert(Field::Password, "Password must be at least 8 characters");
        }

        if self.confirm_password.is_empty() {
            errors.insert(Field::ConfirmPassword, "Confirm password is required");
        } else if self.confirm_password != self.password {
            errors.insert(Field::ConfirmPassword, "Passwords must match");
        }

        let gender = if self.gender.is_empty() {
            errors.insert(Field::Gender, "Gender is required");
            None
        } else {
            self.gender
                .parse::<Gender>()
                .map_err(|_| errors.insert(Field::Gender, "Gender must be male or female"))
                .ok()
        };

        let country = if self.country.is_empty() {
            errors.insert(Field::Country, "Country is required");
            None
        } else {
            self.country
                .parse::<Country>()
                .map_err(|_| errors.insert(Field::Country, "Country is not supported"))
                .ok()
        };

        if !self.terms {
            errors.insert(Field::Terms, "You must accept the terms and conditions");
        }

        match (gender, country) {
            (Some(gender), Some(country)) if errors.is_empty() => Ok(Registration {
                full_name: self.full_name.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
                gender,
                subscription: self.subscription,
                country,
                terms: self.terms,
            }),
            _ => Err(errors),
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> RegistrationForm {
        RegistrationForm {
            full_name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            password: "cobol-1959".to_string(),
            confirm_password: "cobol-1959".to_string(),
            gender: "female".to_string(),
            subscription: true,
            country: "us".to_string(),
            terms: true,
        }
    }

    #[test]
    fn valid_form_becomes_registration() {
        let registration = filled_form().validate().expect("form should be valid");
        assert_eq!(registration.full_name, "Grace Hopper");
        assert_eq!(registration.gender, Gender::Female);
        assert_eq!(registration.country, Country::Us);
        assert!(registration.subscription);
        assert!(registration.terms);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let errors = RegistrationForm::default()
            .validate()
            .expect_err("empty form must be rejected");

        assert_eq!(errors.get(Field::FullName), Some("Full name is required"));
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::Password), Some("Password is required"));
        assert_eq!(
            errors.get(Field::ConfirmPassword),
            Some("Confirm password is required")
        );
        assert_eq!(errors.get(Field::Gender), Some("Gender is required"));
        assert_eq!(errors.get(Field::Country), Some("Country is required"));
        assert_eq!(
            errors.get(Field::Terms),
            Some("You must accept the terms and conditions")
        );
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn full_name_length_bounds_count_characters() {
        let mut form = filled_form();

        form.full_name = "J".to_string();
        let errors = form.validate().expect_err("one char is too short");
        assert_eq!(errors.get(Field::FullName), Some("Full name is too short"));

        form.full_name = "Jo".to_string();
        assert!(form.validate().is_ok());

        form.full_name = "é".repeat(50);
        assert!(form.validate().is_ok());

        form.full_name = "é".repeat(51);
        let errors = form.validate().expect_err("51 chars is too long");
        assert_eq!(errors.get(Field::FullName), Some("Full name is too long"));
    }

    #[test]
    fn rejects_malformed_email() {
        let mut form = filled_form();
        for email in ["grace", "grace@", "@example.com", "grace@example", "gr ace@example.com"] {
            form.email = email.to_string();
            let errors = form.validate().expect_err("email should be rejected");
            assert_eq!(errors.get(Field::Email), Some("Invalid email address"), "{email}");
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let mut form = filled_form();
        form.password = "short".to_string();
        form.confirm_password = "short".to_string();

        let errors = form.validate().expect_err("short password must fail");
        assert_eq!(
            errors.get(Field::Password),
            Some("Password must be at least 8 characters")
        );
        assert!(!errors.contains(Field::ConfirmPassword));
    }

    #[test]
    fn password_mismatch_blocks_submission() {
        let mut form = filled_form();
        form.confirm_password = "cobol-1960".to_string();

        let errors = form.validate().expect_err("mismatch must fail");
        assert_eq!(errors.get(Field::ConfirmPassword), Some("Passwords must match"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn unaccepted_terms_are_rejected() {
        let mut form = filled_form();
        form.terms = false;

        let errors = form.validate().expect_err("terms must be accepted");
        assert_eq!(
            errors.get(Field::Terms),
            Some("You must accept the terms and conditions")
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn closed_lists_reject_unknown_values() {
        let mut form = filled_form();
        form.gender = "other".to_string();
        form.country = "fr".to_string();

        let errors = form.validate().expect_err("unknown enum values must fail");
        assert_eq!(errors.get(Field::Gender), Some("Gender must be male or female"));
        assert_eq!(errors.get(Field::Country), Some("Country is not supported"));
    }

    #[test]
    fn reset_restores_initial_values() {
        let mut form = filled_form();
        form.reset();
        assert_eq!(form, RegistrationForm::default());
        assert!(!form.subscription);
        assert!(!form.terms);
    }

    #[test]
    fn serializes_with_form_field_names() {
        let value = serde_json::to_value(filled_form()).expect("form should serialize");
        assert_eq!(value["fullName"], "Grace Hopper");
        assert_eq!(value["confirmPassword"], "cobol-1959");
        assert_eq!(value["terms"], true);

        let mut form = filled_form();
        form.terms = false;
        let errors = form.validate().expect_err("terms must be accepted");
        let value = serde_json::to_value(&errors).expect("errors should serialize");
        assert_eq!(value["terms"], "You must accept the terms and conditions");

        let errors = RegistrationForm::default()
            .validate()
            .expect_err("empty form must be rejected");
        let value = serde_json::to_value(&errors).expect("errors should serialize");
        let form_value = serde_json::to_value(RegistrationForm::default()).unwrap();
        for (field, _) in errors.iter() {
            assert!(value.get(field.as_str()).is_some(), "{field:?}");
            assert!(form_value.get(field.as_str()).is_some(), "{field:?}");
        }
    }
}
