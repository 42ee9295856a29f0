use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::form::FormErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Self::Male, Self::Female];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|gender| gender.as_str() == raw)
            .ok_or_else(|| UnknownValue(raw.to_string()))
    }
}

/// Countries offered by the registration form. The list is closed: any other
/// code is rejected during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    Us,
    Ca,
    Uk,
    Au,
}

impl Country {
    pub const ALL: [Country; 4] = [Self::Us, Self::Ca, Self::Uk, Self::Au];

    pub fn code(self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Ca => "ca",
            Self::Uk => "uk",
            Self::Au => "au",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Us => "United States",
            Self::Ca => "Canada",
            Self::Uk => "United Kingdom",
            Self::Au => "Australia",
        }
    }
}

impl FromStr for Country {
    type Err = UnknownValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|country| country.code() == raw)
            .ok_or_else(|| UnknownValue(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownValue(pub String);

/// A registration that passed form validation. Still carries the plaintext
/// password; it only lives until the store hashes it.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub subscription: bool,
    pub country: Country,
    pub terms: bool,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("gender", &self.gender)
            .field("subscription", &self.subscription)
            .field("country", &self.country)
            .field("terms", &self.terms)
            .finish()
    }
}

/// One entry of the persisted collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: Gender,
    pub subscription: bool,
    pub country: Country,
    pub terms: bool,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct ValidationFailedResponse {
    pub message: &'static str,
    pub errors: FormErrors,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
