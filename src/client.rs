//! Client side of the registration flow: validate the form locally, post it
//! to the backend and turn the result into a user-facing notice.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::form::{FormErrors, RegistrationForm};

pub const REGISTER_PATH: &str = "/api/register";

pub const NOTICE_REGISTERED: &str = "Registration successful!";
pub const NOTICE_REJECTED: &str = "Error during registration";
pub const NOTICE_FAILED: &str = "Error submitting the form";

#[derive(Debug, Error)]
#[error("request to {url} failed: {source}")]
pub struct SubmitError {
    pub url: String,
    pub source: reqwest::Error,
}

/// Transport used by [`FormCollector`]. Returns the HTTP status of the
/// create request.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, form: &RegistrationForm) -> Result<u16, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubmitter {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), REGISTER_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, form: &RegistrationForm) -> Result<u16, SubmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(form)
            .send()
            .await
            .map_err(|source| SubmitError {
                url: self.endpoint.clone(),
                source,
            })?;

        Ok(response.status().as_u16())
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Invalid(FormErrors),
    /// The backend accepted the registration and the form was cleared.
    Registered,
    /// The backend answered with a non-success status.
    Rejected { status: u16 },
    /// The request never got an answer.
    Failed(SubmitError),
}

impl SubmitOutcome {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Invalid(_) => None,
            Self::Registered => Some(NOTICE_REGISTERED),
            Self::Rejected { .. } => Some(NOTICE_REJECTED),
            Self::Failed(_) => Some(NOTICE_FAILED),
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }
}

pub struct FormCollector<S> {
    form: RegistrationForm,
    submitter: S,
}

impl<S: Submitter> FormCollector<S> {
    pub fn new(submitter: S) -> Self {
        Self::with_form(submitter, RegistrationForm::default())
    }

    pub fn with_form(submitter: S, form: RegistrationForm) -> Self {
        Self { form, submitter }
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.form
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Validates and submits the current form. Fields are only cleared when
    /// the backend accepts the registration.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if let Err(errors) = self.form.validate() {
            return SubmitOutcome::Invalid(errors);
        }

        match self.submitter.submit(&self.form).await {
            Ok(status) if (200..300).contains(&status) => {
                debug!(status, "registration accepted");
                self.form.reset();
                SubmitOutcome::Registered
            }
            Ok(status) => {
                warn!(status, "registration rejected by server");
                SubmitOutcome::Rejected { status }
            }
            Err(err) => {
                warn!(error = %err, "registration request failed");
                SubmitOutcome::Failed(err)
            }
        }
    }
}
