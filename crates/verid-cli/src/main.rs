//! `verid`: run identity verifications from the command line.
//!
//! # Usage
//!
//! ```
//! verid verify --selfie selfie.jpg --document id-card.jpg
//! verid --url http://10.0.0.5:8000 health
//! verid profile
//! verid set-name "Ana Lee"
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use settings::{Overrides, Settings};
use strum::IntoEnumIterator as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use verid_client::{FileEncoder, HttpBackend};
use verid_core::{
  backend::VerificationBackend,
  evidence::{EvidenceItem, EvidenceKind},
  fields::IdentityField,
  record::UserIdentityRecord,
  workflow::WorkflowStep,
};
use verid_store_sqlite::SqliteStore;
use verid_workflow::{IdentityRecordStore, WorkflowController, WorkflowState};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "verid", version, about = "Identity verification client")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "verid.toml")]
  config: PathBuf,

  /// Base URL of the verification service (default: http://localhost:8000).
  #[arg(long, env = "VERID_URL")]
  url: Option<String>,

  /// SQLite file holding the identity record (default: verid.db).
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Verify a selfie against an identity document.
  Verify {
    #[arg(long, value_name = "IMAGE")]
    selfie:   String,
    #[arg(long, value_name = "IMAGE")]
    document: String,
    /// Extra attempts after a retryable failure.
    #[arg(long, default_value_t = 0)]
    retries:  u32,
    /// Print the final workflow state as JSON.
    #[arg(long)]
    json:     bool,
  },
  /// Check that the verification service is up.
  Health,
  /// Show the stored identity record.
  Profile {
    #[arg(long)]
    json: bool,
  },
  /// Set the display name; later verifications keep it.
  SetName { name: String },
  /// Delete the stored record and last verification.
  Clear,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config, Overrides {
    url:   cli.url,
    store: cli.store,
  })?;

  let backend = HttpBackend::new(settings.backend.clone())?;
  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let records = Arc::new(IdentityRecordStore::new(store));

  match cli.command {
    Command::Verify {
      selfie,
      document,
      retries,
      json,
    } => {
      let controller = WorkflowController::new(backend, FileEncoder::default(), records);
      let state = verify(&controller, selfie, document, retries).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
      } else {
        print_outcome(&state);
      }
      if let Some(failure) = &state.last_error {
        bail!("verification failed: {}", failure.message);
      }
    }

    Command::Health => {
      tracing::info!(url = backend.base_url(), "checking service");
      if !backend.test_connection().await {
        bail!("{} is not reachable", backend.base_url());
      }
      let health = backend.health_check().await?;
      println!("{}", serde_json::to_string_pretty(&health)?);
      if !health.is_healthy() {
        bail!("service reports status {:?}", health.status);
      }
    }

    Command::Profile { json } => {
      let record = records.load().await?;
      let fields = records.latest_fields().await?;
      if json {
        let profile = serde_json::json!({ "record": record, "fields": fields });
        println!("{}", serde_json::to_string_pretty(&profile)?);
      } else {
        print_record(&record);
        for field in IdentityField::iter() {
          if let Some(value) = fields.get(field) {
            println!("{:>16}: {value}", field.to_string());
          }
        }
      }
    }

    Command::SetName { name } => {
      let record = records.set_display_name(&name).await?;
      println!("display name set to {}", record.display_name);
    }

    Command::Clear => {
      records.clear().await?;
      println!("identity data cleared");
    }
  }

  Ok(())
}

/// Capture both images, transmit, and retry retryable failures up to
/// `retries` times.
async fn verify(
  controller: &WorkflowController<HttpBackend, FileEncoder, SqliteStore>,
  selfie: String,
  document: String,
  retries: u32,
) -> anyhow::Result<WorkflowState> {
  controller
    .capture(EvidenceItem::new(EvidenceKind::Selfie, selfie)?)
    .await?;
  controller
    .capture(EvidenceItem::new(EvidenceKind::Document, document)?)
    .await?;

  let mut state = controller.transmit().await?;
  for _ in 0..retries {
    if state.step != WorkflowStep::Failed {
      break;
    }
    // Failures that need a fresh capture cannot be retried from here.
    if controller.retry().await?.step != WorkflowStep::Transmitting {
      break;
    }
    state = controller.transmit().await?;
  }
  Ok(state)
}

fn print_outcome(state: &WorkflowState) {
  if let Some(failure) = &state.last_error {
    eprintln!("failed during {} ({}): {}", failure.during, failure.kind, failure.message);
    return;
  }
  if let Some(record) = &state.record {
    print_record(record);
  }
  if let Some(confidence) = state.confidence {
    println!("{:>16}: {:.0}%", "confidence", confidence * 100.0);
  }
  if let Some(status) = state.document_status {
    println!("{:>16}: {status:?}", "document");
  }
  if let Some(warning) = &state.persistence_warning {
    eprintln!("warning: record not saved: {}", warning.message);
  }
}

fn print_record(record: &UserIdentityRecord) {
  println!("{:>16}: {}", "name", record.display_name);
  println!("{:>16}: {}", "verified", if record.is_verified { "yes" } else { "no" });
  if !record.verification_date.is_empty() {
    println!("{:>16}: {}", "date", record.verification_date);
  }
}
