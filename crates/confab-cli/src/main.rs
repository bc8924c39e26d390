//! Confab chat CLI entry point.
//!
//! Binary name: `confab`
//!
//! Parses CLI arguments, wires the engine to its HTTP and filesystem
//! collaborators, hydrates, then runs the interactive chat loop. Session
//! management is exposed through slash commands; everything else is sent
//! as a message.

mod commands;

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use console::style;
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use confab_core::auth::AuthSessionProvider;
use confab_core::engine::ChatEngine;
use confab_infra::auth::DeviceAuthSession;
use confab_infra::config::{default_data_dir, load_config};
use confab_infra::http::assistant::OpenAiCompatGenerator;
use confab_infra::http::history::HttpHistoryClient;
use confab_infra::http::report::HttpReportSink;
use confab_infra::local::TempChatStore;
use confab_infra::token::BearerCell;
use confab_types::error::EngineError;
use confab_types::identity::IdentityMode;

type Engine = ChatEngine<
    DeviceAuthSession,
    OpenAiCompatGenerator,
    HttpHistoryClient,
    TempChatStore,
    HttpReportSink,
>;

#[derive(Parser)]
#[command(name = "confab", about = "Chat with synced session history from the terminal")]
struct Cli {
    /// Chat API base URL (overrides config.toml)
    #[arg(long)]
    base_url: Option<String>,

    /// Log in as this user id on startup (requires --token)
    #[arg(long)]
    user: Option<String>,

    /// Bearer token for the chat history API
    #[arg(long, env = "CONFAB_TOKEN")]
    token: Option<String>,

    /// Data directory (defaults to ~/.confab)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,confab=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let mut config = load_config(&data_dir).await;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    let tokens = BearerCell::new();
    let auth = DeviceAuthSession::new(tokens.clone());
    if let (Some(user_id), Some(token)) = (cli.user, cli.token) {
        auth.login(user_id, SecretString::from(token));
    }

    let engine: Arc<Engine> = Arc::new(ChatEngine::new(
        auth.clone(),
        OpenAiCompatGenerator::new(&config.assistant),
        HttpHistoryClient::new(&config.api, auth.subscribe(), tokens.clone()),
        TempChatStore::new(&data_dir),
        HttpReportSink::new(&config.api, tokens),
    ));

    if let Err(err) = engine.hydrate().await {
        notice(&format!("{err}"));
    }
    {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.watch_identity().await });
    }

    print_banner(&engine).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&engine).await;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        match commands::parse(&line) {
            Some(command) => {
                if run_command(&engine, &auth, command).await {
                    break;
                }
            }
            None => send(&engine, &line).await,
        }
    }

    println!("  {}", style("Bye.").dim());
    Ok(())
}

async fn print_banner(engine: &Engine) {
    println!();
    println!("  {}", style("confab").bold());
    match engine.identity_mode().await {
        IdentityMode::Guest => {
            println!("  {}", style("Guest mode: log in to save your chat history.").dim());
        }
        IdentityMode::Authenticated => {
            let count = engine.sorted_view().await.len();
            println!("  {}", style(format!("Synced {count} chats.")).dim());
        }
    }
    println!("  {}", style("/help for commands, Ctrl+D to exit.").dim());
    println!();
}

async fn prompt(engine: &Engine) {
    if engine.is_guest_locked().await {
        print!("  {} ", style("locked >").red().bold());
    } else {
        print!("  {} ", style("you >").green().bold());
    }
    let _ = std::io::stdout().flush();
}

async fn send(engine: &Engine, text: &str) {
    match engine.send_message(text).await {
        Ok(outcome) => {
            println!("  {} {}", style("confab >").cyan().bold(), outcome.assistant.text);
            if let Some(err) = outcome.save_error {
                notice(&format!("{err}"));
            }
        }
        Err(err) => print_engine_error(&err),
    }
}

/// Run one slash command. Returns true when the loop should exit.
async fn run_command(engine: &Engine, auth: &DeviceAuthSession, command: commands::Command) -> bool {
    use commands::Command;

    match command {
        Command::Help => commands::print_help(),
        Command::Quit => return true,
        Command::New => {
            if let Err(err) = engine.new_session().await {
                print_engine_error(&err);
            } else {
                println!("  {}", style("Started a new chat.").dim());
            }
        }
        Command::Chats => print_chats(engine).await,
        Command::Open(id) => match engine.select_session(&id).await {
            Ok(()) => print_active(engine).await,
            Err(err) => print_engine_error(&err),
        },
        Command::Rename { id, title } => match engine.rename_session(&id, &title).await {
            Ok(()) => println!("  {}", style("Chat renamed.").dim()),
            Err(err) => print_engine_error(&err),
        },
        Command::Pin(id) => match engine.toggle_pin(&id).await {
            Ok(()) => println!("  {}", style("Pin toggled.").dim()),
            Err(err) => print_engine_error(&err),
        },
        Command::Delete(id) => match engine.delete_session(&id).await {
            Ok(()) => println!("  {}", style("Chat deleted.").dim()),
            Err(err) => print_engine_error(&err),
        },
        Command::ClearHistory => match engine.delete_all_sessions().await {
            Ok(()) => println!("  {}", style("Chat history deleted.").dim()),
            Err(err) => print_engine_error(&err),
        },
        Command::Login { user_id, token } => {
            auth.login(user_id, SecretString::from(token));
            println!("  {}", style("Logged in, syncing your chats...").dim());
        }
        Command::Logout => {
            auth.logout();
            println!("  {}", style("Logged out.").dim());
        }
        Command::Unknown(message) => {
            notice(&format!("{message} (try /help)"));
        }
    }
    false
}

async fn print_chats(engine: &Engine) {
    if engine.identity_mode().await == IdentityMode::Guest {
        println!("  {}", style("Log in to save your chat history.").dim());
        return;
    }
    let view = engine.sorted_view().await;
    if view.is_empty() {
        println!("  {}", style("No chats yet.").dim());
        return;
    }
    let active_id = engine.active_id().await;
    for session in view {
        let marker = if active_id.as_deref() == Some(session.id.as_str()) {
            ">"
        } else {
            " "
        };
        let pin = if session.pinned { "*" } else { " " };
        println!(
            "  {marker}{pin} {}  {} {}",
            style(&session.id).dim(),
            session.title,
            style(format!("({} messages)", session.messages.len())).dim()
        );
    }
}

async fn print_active(engine: &Engine) {
    for message in engine.active_messages().await {
        match message.sender {
            confab_types::chat::Sender::User => {
                println!("  {} {}", style("you >").green(), message.text)
            }
            confab_types::chat::Sender::Assistant => {
                println!("  {} {}", style("confab >").cyan(), message.text)
            }
        }
    }
}

fn print_engine_error(err: &EngineError) {
    let text = match err {
        EngineError::QuotaExceeded => "Message limit reached. Log in to keep chatting.",
        EngineError::PolicyViolation => {
            "This message violates our safety policy and has been reported."
        }
        EngineError::EmptyMessage => "Type a message first.",
        EngineError::SendInFlight => "Still waiting on the last reply.",
        EngineError::NotReady => "Still loading your chats, try again in a moment.",
        EngineError::History(_) | EngineError::Ephemeral(_) => {
            notice(&format!("{err}"));
            return;
        }
    };
    notice(text);
}

fn notice(text: &str) {
    eprintln!("  {} {text}", style("!").yellow().bold());
}
