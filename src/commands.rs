//! CLI command implementations.
//!
//! Each `run_*` function backs one `docubot` subcommand. Answers and
//! listings go to stdout; warnings go to stderr with a `Warning:` prefix.
//!
//! Commands that only touch stored sessions (`new`, `sessions`, `upload`,
//! `history`, `delete`, `clear`) never build the embedding or LLM clients,
//! so they work without provider credentials.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use docubot_core::models::Session;
use docubot_core::store::SessionStore;
use docubot_core::AnswerError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::assistant::{create_session, open_session, upload_documents, Assistant};
use crate::config::{Config, LlmConfig, LlmOverrides};
use crate::llm::create_generator;
use crate::session_store::FileSessionStore;

/// Message shown when a question is asked before any upload.
pub const UPLOAD_FIRST: &str = "Please upload PDFs before asking questions.";

fn file_store(cfg: &Config) -> FileSessionStore {
    FileSessionStore::new(&cfg.sessions.dir)
}

fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("Warning: {}", w);
    }
}

pub async fn run_new(cfg: &Config) -> Result<()> {
    let session = create_session(&file_store(cfg)).await?;
    println!("{}", session.id);
    Ok(())
}

pub async fn run_sessions(cfg: &Config) -> Result<()> {
    let ids = file_store(cfg).list_sessions().await?;
    if ids.is_empty() {
        eprintln!("No saved sessions.");
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

pub async fn run_upload(cfg: &Config, session: Option<&str>, paths: &[PathBuf]) -> Result<()> {
    let store = file_store(cfg);
    let mut session = open_session(&store, session).await?;
    let warnings = upload_documents(&store, &mut session, paths, cfg.upload.max_file_bytes).await?;
    print_warnings(&warnings);

    let extracted = session.documents.len() - warnings.len();
    println!(
        "Uploaded {} file(s) to {} ({} with text)",
        session.documents.len(),
        session.id,
        extracted
    );
    Ok(())
}

/// Ask one question and print the answer.
///
/// Asking before any upload prints a warning and succeeds; provider
/// failures are errors.
pub async fn run_ask(
    cfg: &Config,
    session: Option<&str>,
    overrides: &LlmOverrides,
    question: &str,
) -> Result<()> {
    let llm = cfg.llm.with_overrides(overrides)?;
    let mut assistant = Assistant::from_config(cfg, &llm)?;
    let mut session = assistant.open_session(session).await?;
    ask_and_print(&mut assistant, &mut session, question).await
}

async fn ask_and_print(assistant: &mut Assistant, session: &mut Session, question: &str) -> Result<()> {
    match assistant.ask(session, question).await {
        Ok(answer) => {
            println!("{}", answer.text);
            Ok(())
        }
        Err(e) if matches!(e.downcast_ref::<AnswerError>(), Some(AnswerError::NoDocuments)) => {
            eprintln!("Warning: {}", UPLOAD_FIRST);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Interactive question loop on stdin. Ends on `/quit`, `/exit` or EOF.
pub async fn run_chat(cfg: &Config, session: Option<&str>, overrides: &LlmOverrides) -> Result<()> {
    let mut llm = cfg.llm.with_overrides(overrides)?;
    let mut assistant = Assistant::from_config(cfg, &llm)?;
    let mut session = assistant.open_session(session).await?;

    eprintln!(
        "Session {} ({} document(s)). Type /help for commands.",
        session.id,
        session.documents.len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        // Failures inside the loop are reported and the loop continues.
        let outcome = match command {
            "/quit" | "/exit" => break,
            "/help" => {
                print_chat_help();
                Ok(())
            }
            "/history" => {
                print_history(&session);
                Ok(())
            }
            "/new" => assistant.new_session().await.map(|s| {
                eprintln!("Started session {}", s.id);
                session = s;
            }),
            "/upload" => {
                let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if paths.is_empty() {
                    Err(anyhow::anyhow!("usage: /upload <path>..."))
                } else {
                    assistant.upload(&mut session, &paths).await.map(|warnings| {
                        print_warnings(&warnings);
                        eprintln!("Uploaded {} file(s)", session.documents.len());
                    })
                }
            }
            "/model" | "/temperature" | "/max-tokens" => {
                match apply_setting(&llm, command, rest) {
                    Ok(updated) => create_generator(&updated).map(|generator| {
                        assistant.set_generator(generator);
                        llm = updated;
                        eprintln!(
                            "model={} temperature={} max_tokens={}",
                            llm.model, llm.temperature, llm.max_tokens
                        );
                    }),
                    Err(e) => Err(e),
                }
            }
            other if other.starts_with('/') => Err(anyhow::anyhow!("unknown command: {}", other)),
            _ => ask_and_print(&mut assistant, &mut session, line).await,
        };

        if let Err(e) = outcome {
            eprintln!("Error: {:#}", e);
        }
    }

    debug!(id = %session.id, "chat ended");
    Ok(())
}

fn apply_setting(llm: &LlmConfig, command: &str, value: &str) -> Result<LlmConfig> {
    if value.is_empty() {
        bail!("usage: {} <value>", command);
    }
    let mut overrides = LlmOverrides::default();
    match command {
        "/model" => overrides.model = Some(value.to_string()),
        "/temperature" => overrides.temperature = Some(value.parse()?),
        "/max-tokens" => overrides.max_tokens = Some(value.parse()?),
        other => bail!("unknown setting: {}", other),
    }
    llm.with_overrides(&overrides)
}

fn print_chat_help() {
    eprintln!("  <question>              ask about the uploaded documents");
    eprintln!("  /upload <path>...       replace the uploaded documents");
    eprintln!("  /history                show this session's conversation");
    eprintln!("  /new                    start a new session");
    eprintln!("  /model <name>           change the LLM model");
    eprintln!("  /temperature <0.0-1.0>  change the sampling temperature");
    eprintln!("  /max-tokens <100-2000>  change the answer length limit");
    eprintln!("  /quit                   leave");
}

fn print_history(session: &Session) {
    println!("Session: {}", session.id);
    if session.documents.is_empty() {
        println!("Documents: (none)");
    } else {
        println!("Documents: {}", session.documents.filenames().join(", "));
    }
    for message in &session.messages {
        println!();
        println!("[{}]", message.role);
        println!("{}", message.text);
    }
}

pub async fn run_history(cfg: &Config, session: Option<&str>) -> Result<()> {
    let store = file_store(cfg);
    let session = match session {
        Some(id) => store.load_session(id).await?,
        None => match store.list_sessions().await?.first() {
            Some(latest) => store.load_session(latest).await?,
            None => {
                eprintln!("No saved sessions.");
                return Ok(());
            }
        },
    };
    print_history(&session);
    Ok(())
}

pub async fn run_delete(cfg: &Config, id: &str) -> Result<()> {
    if !file_store(cfg).delete_session(id).await? {
        bail!("No such session: {}", id);
    }
    println!("Deleted {}", id);
    Ok(())
}

pub async fn run_clear(cfg: &Config) -> Result<()> {
    let removed = file_store(cfg).clear_sessions().await?;
    println!("Deleted {} session(s)", removed);
    Ok(())
}

pub fn run_config(cfg: &Config) -> Result<()> {
    print!("{}", cfg.to_toml()?);
    Ok(())
}
