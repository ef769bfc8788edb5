mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::TimeZone;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use cliniq_config::Config;
use cliniq_core::{
    generate_soap_note, system_instruction, ChatEvent, ConsultError, Consultation, PatientIntake, RiskDetector,
    NOTE_ERROR_MESSAGE, STARTER_PROMPTS,
};
use cliniq_model::{Attachment, Message, ResponderFactory, Role};
use cliniq_store::{export_file_name, export_transcript, BlobStore, SessionStore};

const DEFAULT_WIDTH: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Handle subcommands that need no config first
    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let config = cliniq_config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Completions { .. }) => Ok(()),
        Some(Commands::ShowConfig) => {
            println!("{}", toml::to_string_pretty(&config).context("serializing config")?);
            Ok(())
        }
        Some(Commands::Chats { limit }) => {
            print_chats(&SessionStore::open(&config.store), &config, limit);
            Ok(())
        }
        Some(Commands::Show { id, raw }) => show_chat(&config, &id, raw),
        Some(Commands::Export { id, output }) => export_chat(&config, &id, output.as_deref()),
        Some(Commands::Delete { id }) => delete_chat(&config, &id),
        Some(Commands::Note { id }) => note_cmd(&config, &id).await,
        Some(Commands::Chat { resume, intake }) => run_chat(&config, resume, intake).await,
        None => run_chat(&config, None, false).await,
    }
}

/// The configured backend, primed with the system instruction for the
/// configured risk marker.
fn responder_factory(config: &Config) -> anyhow::Result<Arc<dyn ResponderFactory>> {
    let instruction = system_instruction(&config.session.risk_marker);
    let factory = cliniq_model::from_config(&config.responder, &instruction)?;
    tracing::debug!(backend = factory.name(), model = %config.responder.name, "responder ready");
    Ok(factory)
}

// ─── History commands ────────────────────────────────────────────────────────

fn format_timestamp(ms: i64) -> String {
    chrono::Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn print_chats<B: BlobStore>(store: &SessionStore<B>, config: &Config, limit: usize) {
    let records = store.load_history();
    if records.is_empty() {
        println!("No saved sessions found.");
        println!("Sessions are stored in: {}", config.store.resolved_dir().display());
        return;
    }
    println!("{:<32}  {:<16}  {:<5}  TITLE", "ID (use with --resume)", "DATE", "MSGS");
    println!("{}", "-".repeat(90));
    for r in records.iter().take(limit) {
        println!(
            "{:<32}  {:<16}  {:<5}  {}",
            r.id,
            format_timestamp(r.timestamp),
            r.messages.len(),
            r.title
        );
    }
    println!("\nTotal: {} session(s)", records.len());
}

fn print_message(message: &Message, risk: &RiskDetector, width: usize) {
    println!("── {} ──", message.role.label());
    match message.role {
        Role::User => println!("{}", message.text),
        Role::Ai => {
            if risk.detect(&message.text) {
                println!("!! RISK ALERT: follow standard clinical safety protocols.\n");
            }
            let doc = cliniq_doc::parse(risk.strip(&message.text));
            println!("{}", cliniq_doc::render_text(&doc, width));
        }
    }
    println!();
}

fn show_chat(config: &Config, id: &str, raw: bool) -> anyhow::Result<()> {
    let record = SessionStore::open(&config.store).require_record(id)?;
    if raw {
        print!("{}", export_transcript(&record.messages));
        return Ok(());
    }
    println!("{}  ({})\n", record.title, format_timestamp(record.timestamp));
    let risk = RiskDetector::new(config.session.risk_marker.clone());
    for m in &record.messages {
        print_message(m, &risk, terminal_width());
    }
    Ok(())
}

fn export_chat(config: &Config, id: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let record = SessionStore::open(&config.store).require_record(id)?;
    let content = export_transcript(&record.messages);
    let path = match output {
        Some(p) if p == Path::new("-") => {
            print!("{content}");
            return Ok(());
        }
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(export_file_name(&record)),
    };
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("Exported {} message(s) to {}", record.messages.len(), path.display());
    Ok(())
}

fn delete_chat(config: &Config, id: &str) -> anyhow::Result<()> {
    let store = SessionStore::open(&config.store);
    store.require_record(id)?;
    let left = store.delete_record_from_history(id);
    println!("Deleted {id}. {} session(s) remain.", left.len());
    Ok(())
}

async fn note_cmd(config: &Config, id: &str) -> anyhow::Result<()> {
    let record = SessionStore::open(&config.store).require_record(id)?;
    let factory = responder_factory(config)?;
    match generate_soap_note(factory.as_ref(), &record.messages).await {
        Ok(note) => {
            println!("{}", cliniq_doc::render_text(&cliniq_doc::parse(&note), terminal_width()));
            Ok(())
        }
        Err(e @ ConsultError::NoteFailed(_)) => {
            eprintln!("{NOTE_ERROR_MESSAGE}");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

// ─── Interactive chat ────────────────────────────────────────────────────────

const CHAT_HELP: &str = "\
Commands:
  /1 /2 /3 <text>   start from a starter prompt
  /attach <PATH>    attach a file to the next message
  /note             SOAP note of this session
  /new              start a new session
  /history          list saved sessions
  /open <ID>        resume a saved session
  /delete <ID>      delete a saved session
  /quit             leave (Ctrl-D works too)
Ctrl-C while a reply streams abandons it.";

type StdinLines = Lines<BufReader<Stdin>>;

async fn run_chat(config: &Config, resume: Option<String>, intake: bool) -> anyhow::Result<()> {
    let factory = responder_factory(config)?;
    let store = SessionStore::open(&config.store);
    let mut consult = Consultation::new(factory, store, config.session.clone())?;
    let width = terminal_width();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    match resume {
        Some(id) => {
            consult.select_chat(&id)?;
            for m in consult.messages() {
                print_message(m, consult.risk_detector(), width);
            }
        }
        None => {
            print_message(&consult.messages()[0], consult.risk_detector(), width);
            for (i, p) in STARTER_PROMPTS.iter().enumerate() {
                println!("  /{}  {}", i + 1, p.title);
            }
            println!("  /help for commands\n");
        }
    }

    if intake {
        let Some(prompt) = read_intake(&mut lines).await? else {
            return Ok(());
        };
        send_and_print(&mut consult, &prompt, None, width).await;
    }

    let mut attachment: Option<Attachment> = None;
    loop {
        let Some(line) = prompt_line(&mut lines, "> ").await? else {
            break;
        };
        let line = line.trim_end();
        let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
        match cmd {
            "/quit" | "/exit" => break,
            "/help" => println!("{CHAT_HELP}"),
            "/new" => match consult.new_chat() {
                Ok(()) => {
                    attachment = None;
                    print_message(&consult.messages()[0], consult.risk_detector(), width);
                }
                Err(e) => eprintln!("{e}"),
            },
            "/history" => print_chats(consult.store(), config, usize::MAX),
            "/open" => match consult.select_chat(arg.trim()) {
                Ok(()) => {
                    for m in consult.messages() {
                        print_message(m, consult.risk_detector(), width);
                    }
                }
                Err(e) => eprintln!("{e}"),
            },
            "/delete" => match consult.delete_chat(arg.trim()) {
                Ok(()) => println!("{} session(s) remain.", consult.history().len()),
                Err(e) => eprintln!("{e}"),
            },
            "/note" => match consult.soap_note().await {
                Ok(note) => println!("{}\n", cliniq_doc::render_text(&cliniq_doc::parse(&note), width)),
                Err(ConsultError::NoteFailed(_)) => eprintln!("{NOTE_ERROR_MESSAGE}"),
                Err(e) => eprintln!("{e}"),
            },
            "/attach" => match read_attachment(Path::new(arg.trim())) {
                Ok(a) => {
                    println!("Attached {} ({} bytes).", a.mime_type, a.data.len());
                    attachment = Some(a);
                }
                Err(e) => eprintln!("{e:#}"),
            },
            "/1" | "/2" | "/3" => {
                let index = cmd[1..].parse::<usize>().unwrap_or(1) - 1;
                let text = format!("{}{}", STARTER_PROMPTS[index].prompt, arg);
                send_and_print(&mut consult, &text, attachment.take(), width).await;
            }
            _ if cmd.starts_with('/') => eprintln!("unknown command {cmd}; /help lists commands"),
            _ => {
                if line.trim().is_empty() && attachment.is_none() {
                    continue;
                }
                send_and_print(&mut consult, line, attachment.take(), width).await;
            }
        }
    }
    Ok(())
}

/// Send one message, show progress while it streams and print the rendered
/// reply.  Errors are reported, not propagated; the session stays usable.
async fn send_and_print<B: BlobStore>(
    consult: &mut Consultation<B>,
    text: &str,
    attachment: Option<Attachment>,
    width: usize,
) {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(());
        }
    });

    let (tx, mut rx) = mpsc::channel::<ChatEvent>(64);
    let risk = consult.risk_detector().clone();
    let printer = tokio::spawn(async move {
        let mut stderr = tokio::io::stderr();
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Placeholder | ChatEvent::TextUpdated(_) => {
                    let _ = stderr.write_all(b".").await;
                    let _ = stderr.flush().await;
                }
                ChatEvent::Completed { text, risk_alert, .. } => {
                    let _ = stderr.write_all(b"\n").await;
                    print_message(&Message::ai(text), &risk, width);
                    if risk_alert {
                        eprintln!("!! Risk of harm flagged in this reply.");
                    }
                }
                ChatEvent::Failed { message, .. } => {
                    let _ = stderr.write_all(b"\n").await;
                    eprintln!("{message}");
                }
            }
        }
    });

    let result = consult.send_with_cancel(text, attachment, tx, cancel_rx).await;
    watcher.abort();
    let _ = printer.await;

    if let Err(e) = result {
        eprintln!("{e}");
    }
}

async fn prompt_line(lines: &mut StdinLines, prompt: &str) -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await.context("reading stdin")?)
}

/// Ask for every intake field until the form validates.  `None` on EOF.
async fn read_intake(lines: &mut StdinLines) -> anyhow::Result<Option<String>> {
    println!("New patient record (empty answer skips optional fields)");
    loop {
        let mut form = PatientIntake::default();
        let fields: [(&str, &mut String); 7] = [
            ("Patient identifier*", &mut form.identifier),
            ("Age", &mut form.age),
            ("Gender", &mut form.gender),
            ("Chief complaint*", &mut form.chief_complaint),
            ("Medical history", &mut form.medical_history),
            ("Current medications", &mut form.current_medications),
            ("Family history", &mut form.family_history),
        ];
        for (label, slot) in fields {
            let Some(answer) = prompt_line(lines, &format!("{label}: ")).await? else {
                return Ok(None);
            };
            *slot = answer.trim().to_string();
        }
        match form.to_prompt() {
            Ok(prompt) => return Ok(Some(prompt)),
            Err(e) => {
                for field in &e.0 {
                    eprintln!("  {field}");
                }
            }
        }
    }
}

fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    if path.as_os_str().is_empty() {
        bail!("usage: /attach <PATH>");
    }
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mime = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        Some("txt" | "md") => "text/plain",
        _ => "application/octet-stream",
    };
    Ok(Attachment::new(mime, data))
}

fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .filter(|&w: &usize| w > 20)
        .unwrap_or(DEFAULT_WIDTH)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
