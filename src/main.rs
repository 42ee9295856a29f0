use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use registration_desk::{
    FormCollector, HttpSubmitter, RecordStore, RegistrationForm, SubmitOutcome, build_router,
    config::AppConfig,
    form::Field,
    models::{Country, Gender},
    state::AppState,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "registration-desk")]
#[command(about = "Registration form collector and record appender")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service that appends registrations to the details file
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        details_file: Option<PathBuf>,
    },
    /// Fill in the registration form and submit it to a running service
    Register {
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        /// Prefer the environment variable: flags are visible in the process list
        #[arg(long, env = "REGISTRATION_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "REGISTRATION_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        subscribe: bool,
        #[arg(long)]
        accept_terms: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            details_file,
        } => {
            let mut config =
                AppConfig::from_env().context("failed to load application configuration")?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(details_file) = details_file {
                config.details_file = details_file;
            }
            serve(config).await
        }
        Command::Register {
            server,
            full_name,
            email,
            password,
            confirm_password,
            gender,
            country,
            subscribe,
            accept_terms,
        } => {
            let form = RegistrationForm {
                full_name,
                email,
                password,
                confirm_password,
                gender,
                subscription: subscribe,
                country,
                terms: accept_terms,
            };
            register(&server, form).await
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let store = RecordStore::open(&config.details_file, config.bcrypt_cost);
    info!(path = %store.path().display(), "details file");

    let app = build_router(AppState::new(Arc::new(store)));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "registration desk started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn register(server: &str, form: RegistrationForm) -> Result<()> {
    let mut collector = FormCollector::with_form(HttpSubmitter::new(server), form);
    let outcome = collector.submit().await;

    if let SubmitOutcome::Invalid(errors) = &outcome {
        for (field, message) in errors.iter() {
            eprintln!("{}: {message}", field.as_str());
            if let Some(choices) = choices_hint(field) {
                eprintln!("  choose one of: {choices}");
            }
        }
        bail!("registration form is invalid");
    }

    let notice = outcome.notice().unwrap_or_default();
    if !outcome.is_registered() {
        bail!("{notice}");
    }

    println!("{notice}");
    Ok(())
}

fn choices_hint(field: Field) -> Option<String> {
    let choices = match field {
        Field::Gender => Gender::ALL
            .iter()
            .map(|gender| gender.as_str().to_string())
            .collect::<Vec<_>>(),
        Field::Country => Country::ALL
            .iter()
            .map(|country| format!("{} ({})", country.code(), country.label()))
            .collect::<Vec<_>>(),
        _ => return None,
    };
    Some(choices.join(", "))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("registration_desk=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
