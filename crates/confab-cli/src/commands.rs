//! Slash command parsing for the chat REPL.
//!
//! Commands start with `/` and cover every session operation the engine
//! exposes, plus login/logout and help. Anything else is sent as a chat
//! message.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Show available commands.
    Help,
    /// Start composing into a fresh conversation.
    New,
    /// List sessions in display order.
    Chats,
    /// Make a session active.
    Open(String),
    /// Rename a session.
    Rename { id: String, title: String },
    /// Pin or unpin a session.
    Pin(String),
    /// Delete a session.
    Delete(String),
    /// Delete the entire chat history.
    ClearHistory,
    /// Log in with a user id and bearer token.
    Login { user_id: String, token: String },
    /// Log out back to guest mode.
    Logout,
    /// Exit the program.
    Quit,
    /// Unknown command or usage error.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(3, ' ');
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let first = parts.next().map(|s| s.trim().to_string());
    let rest = parts.next().map(|s| s.trim().to_string());

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => Command::Help,
        "/new" => Command::New,
        "/chats" | "/list" => Command::Chats,
        "/open" => match first {
            Some(id) if !id.is_empty() => Command::Open(id),
            _ => Command::Unknown("/open requires a chat id".to_string()),
        },
        "/rename" => match (first, rest) {
            (Some(id), Some(title)) if !id.is_empty() && !title.is_empty() => {
                Command::Rename { id, title }
            }
            _ => Command::Unknown("/rename requires a chat id and a title".to_string()),
        },
        "/pin" => match first {
            Some(id) if !id.is_empty() => Command::Pin(id),
            _ => Command::Unknown("/pin requires a chat id".to_string()),
        },
        "/delete" => match first {
            Some(id) if !id.is_empty() => Command::Delete(id),
            _ => Command::Unknown("/delete requires a chat id".to_string()),
        },
        "/clear-history" => Command::ClearHistory,
        "/login" => match (first, rest) {
            (Some(user_id), Some(token)) if !user_id.is_empty() && !token.is_empty() => {
                Command::Login { user_id, token }
            }
            _ => Command::Unknown("/login requires a user id and a token".to_string()),
        },
        "/logout" => Command::Logout,
        "/exit" | "/quit" | "/q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}             {}", style("/new").cyan(), "Start a new chat");
    println!("  {}           {}", style("/chats").cyan(), "List your chats");
    println!("  {}       {}", style("/open <id>").cyan(), "Open a chat");
    println!(
        "  {} {}",
        style("/rename <id> <t>").cyan(),
        "Rename a chat"
    );
    println!("  {}        {}", style("/pin <id>").cyan(), "Pin or unpin a chat");
    println!("  {}     {}", style("/delete <id>").cyan(), "Delete a chat");
    println!(
        "  {}   {}",
        style("/clear-history").cyan(),
        "Delete your entire history"
    );
    println!(
        "  {} {}",
        style("/login <id> <tok>").cyan(),
        "Log in with a bearer token"
    );
    println!("  {}          {}", style("/logout").cyan(), "Back to guest mode");
    println!("  {}            {}", style("/quit").cyan(), "Exit");
    println!();
    println!("  {}", style("Anything else is sent as a message.").dim());
    println!();
}
