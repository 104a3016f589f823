//! # DocuBot CLI (`docubot`)
//!
//! Ask questions about your documents from the terminal. Upload PDFs (or
//! text files) into a session, then ask; answers are grounded on the
//! passages most similar to the question.
//!
//! ## Usage
//!
//! ```bash
//! docubot --config ./config/docubot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docubot new` | Start an empty session and print its id |
//! | `docubot sessions` | List saved sessions, newest first |
//! | `docubot upload <paths>...` | Replace the session's documents |
//! | `docubot ask "<question>"` | Answer one question |
//! | `docubot chat` | Interactive question loop |
//! | `docubot history` | Print a session's conversation |
//! | `docubot delete <id>` | Delete one session |
//! | `docubot clear` | Delete every session |
//! | `docubot config` | Print the effective configuration |
//!
//! Commands that take `--session` default to the most recent session.
//!
//! ## Examples
//!
//! ```bash
//! docubot upload reports/q1.pdf reports/q2.pdf
//! docubot ask "What was revenue in Q2?"
//! docubot ask --model gpt-4 --temperature 0.2 "Summarize both reports as a table"
//! RUST_LOG=docubot=debug docubot chat
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docubot::commands;
use docubot::config::{self, LlmOverrides};
use tracing_subscriber::EnvFilter;

/// DocuBot: chat with your documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docubot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docubot",
    about = "DocuBot: ask questions about your PDF documents",
    version,
    long_about = "DocuBot extracts the text of uploaded PDFs, retrieves the passages most \
    relevant to a question by embedding similarity, and asks a language model to answer \
    from those passages. Conversations are saved per session."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docubot.toml`. A missing file means defaults.
    #[arg(long, global = true, default_value = "./config/docubot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start a new, empty session and print its id.
    New,

    /// List saved sessions, newest first.
    Sessions,

    /// Upload documents into a session.
    ///
    /// Replaces the session's document set. Directories are searched for
    /// `.pdf`, `.txt` and `.md` files. Files without extractable text are
    /// kept with a warning.
    Upload {
        /// Session id. Defaults to the most recent session.
        #[arg(long)]
        session: Option<String>,

        /// Files or directories to upload.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ask a question about the uploaded documents.
    Ask {
        /// Session id. Defaults to the most recent session.
        #[arg(long)]
        session: Option<String>,

        #[command(flatten)]
        llm: LlmArgs,

        /// The question.
        question: String,
    },

    /// Interactive question loop. `/help` lists chat commands.
    Chat {
        /// Session id. Defaults to the most recent session.
        #[arg(long)]
        session: Option<String>,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Print a session's documents and conversation.
    History {
        /// Session id. Defaults to the most recent session.
        #[arg(long)]
        session: Option<String>,
    },

    /// Delete one session.
    Delete {
        /// Session id.
        id: String,
    },

    /// Delete every saved session.
    Clear,

    /// Print the effective configuration as TOML.
    Config,
}

/// LLM settings that override `[llm]` for one invocation.
#[derive(Args)]
struct LlmArgs {
    /// Model name (e.g. `gpt-3.5-turbo`).
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature, 0.0 to 1.0.
    #[arg(long)]
    temperature: Option<f64>,

    /// Maximum answer length in tokens, 100 to 2000.
    #[arg(long)]
    max_tokens: Option<u32>,
}

impl From<LlmArgs> for LlmOverrides {
    fn from(args: LlmArgs) -> Self {
        LlmOverrides {
            model: args.model,
            temperature: args.temperature,
            max_tokens: args.max_tokens,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::New => commands::run_new(&cfg).await?,
        Commands::Sessions => commands::run_sessions(&cfg).await?,
        Commands::Upload { session, paths } => {
            commands::run_upload(&cfg, session.as_deref(), &paths).await?
        }
        Commands::Ask {
            session,
            llm,
            question,
        } => commands::run_ask(&cfg, session.as_deref(), &llm.into(), &question).await?,
        Commands::Chat { session, llm } => {
            commands::run_chat(&cfg, session.as_deref(), &llm.into()).await?
        }
        Commands::History { session } => commands::run_history(&cfg, session.as_deref()).await?,
        Commands::Delete { id } => commands::run_delete(&cfg, &id).await?,
        Commands::Clear => commands::run_clear(&cfg).await?,
        Commands::Config => commands::run_config(&cfg)?,
    }

    Ok(())
}
