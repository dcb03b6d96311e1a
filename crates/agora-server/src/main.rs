//! `agora` binary.
//!
//! Reads `agora.toml` (or the path specified with `--config`), opens the
//! SQLite store, and either serves the HTTP API or runs an administrative
//! subcommand.
//!
//! # Seeding a poll
//!
//! ```text
//! agora add-question --text "Lunch?" --choice Pizza --choice Salad \
//!   --end-date 2025-01-31T17:00:00Z
//! ```

use std::{path::PathBuf, sync::Arc};

use agora_api::AppState;
use agora_core::{
  clock::{Clock, SystemClock},
  ledger::RetryPolicy,
  service::Polls,
  store::PollStore,
};
use agora_server::{ServerConfig, admin};
use agora_store_sqlite::SqliteStore;
use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Agora polling server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "agora.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Create a question with its choices.
  AddQuestion {
    #[arg(long)]
    text:     String,
    /// May be repeated; choices keep the order given.
    #[arg(long = "choice")]
    choices:  Vec<String>,
    /// RFC 3339; defaults to now.
    #[arg(long)]
    pub_date: Option<DateTime<Utc>>,
    /// RFC 3339; omit for a poll that never closes.
    #[arg(long)]
    end_date: Option<DateTime<Utc>>,
  },
  /// Append a choice to an existing question.
  AddChoice { question: Uuid, text: String },
  /// Delete a question together with its choices and votes.
  DeleteQuestion { question: Uuid },
  /// Delete a choice together with its votes.
  DeleteChoice { choice: Uuid },
  /// Print the published questions with their current tallies.
  List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let clock: Arc<dyn Clock> = Arc::new(SystemClock);
  let polls = Polls::new(Arc::new(store), clock.clone())
    .with_page_size(server_cfg.page_size)
    .with_retry(RetryPolicy::new(server_cfg.vote_retry_attempts));

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(&server_cfg, polls).await?,
    Command::AddQuestion { text, choices, pub_date, end_date } => {
      let q = admin::add_question(
        polls.store().as_ref(),
        text,
        choices,
        pub_date,
        end_date,
        clock.now(),
      )
      .await
      .context("failed to create question")?;
      println!("{}", admin::describe(&q, &[]));
    }
    Command::AddChoice { question, text } => {
      let choice = polls
        .store()
        .add_choice(question, text)
        .await
        .context("failed to add choice")?;
      println!("{}", choice.choice_id);
    }
    Command::DeleteQuestion { question } => {
      let deleted = polls
        .store()
        .delete_question(question)
        .await
        .context("failed to delete question")?;
      anyhow::ensure!(deleted, "question {question} not found");
      tracing::info!(%question, "question deleted");
    }
    Command::DeleteChoice { choice } => {
      let deleted = polls
        .store()
        .delete_choice(choice)
        .await
        .context("failed to delete choice")?;
      anyhow::ensure!(deleted, "choice {choice} not found");
      tracing::info!(%choice, "choice deleted");
    }
    Command::List => {
      let questions = polls
        .list_published_questions()
        .await
        .context("failed to list questions")?;
      if questions.is_empty() {
        println!("No polls are available.");
      }
      for q in &questions {
        let counts = polls
          .store()
          .vote_counts(q.question_id)
          .await
          .context("failed to count votes")?;
        println!("{}", admin::describe(q, &counts));
      }
    }
  }

  Ok(())
}

async fn serve(cfg: &ServerConfig, polls: Polls<SqliteStore>) -> anyhow::Result<()> {
  let header = cfg
    .identity_header_name()
    .with_context(|| format!("invalid identity_header {:?}", cfg.identity_header))?;

  let state   = AppState::new(polls).with_identity_header(header);
  let app     = agora_server::app(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
