pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod handlers;
pub mod models;
pub mod state;
pub mod store;

pub use app::build_router;
pub use client::{FormCollector, HttpSubmitter, SubmitOutcome, Submitter};
pub use form::{FormErrors, RegistrationForm};
pub use store::RecordStore;
