//! Interactive REPL (Read-Eval-Print Loop) for the dev agent.

use std::path::{Path, PathBuf};

use devagent_core::{expand_path, find_mentions, history_file, AgentSettings};
use devagent_models::MessageRole;
use devagent_session::{AgentSession, RequestTicket, WELCOME_MESSAGE};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::debug;

use crate::commands::{self, file_name, format_mentions, read_file, select_mention};

/// Help information for a command.
pub struct CommandHelp {
    /// Command name (e.g., "file").
    pub name: &'static str,
    /// Command aliases (e.g., ["f"]).
    pub aliases: &'static [&'static str],
    /// Brief one-line description.
    pub brief: &'static str,
    /// Usage syntax.
    pub usage: &'static str,
}

static COMMAND_HELP: &[CommandHelp] = &[
    CommandHelp {
        name: "file",
        aliases: &["f"],
        brief: "Load a file as the conversation's context (no path: show it)",
        usage: "/file [path]",
    },
    CommandHelp {
        name: "upload",
        aliases: &["u"],
        brief: "Run a command against a file without loading it",
        usage: "/upload <path> <command>",
    },
    CommandHelp {
        name: "agent",
        aliases: &["a"],
        brief: "Send an @dev-agent command as-is with the loaded file",
        usage: "/agent <command>",
    },
    CommandHelp {
        name: "code",
        aliases: &[],
        brief: "Send text as a custom command with the loaded file",
        usage: "/code <text>",
    },
    CommandHelp {
        name: "mentions",
        aliases: &["m"],
        brief: "List @dev-agent mentions in the loaded file, or run one",
        usage: "/mentions [n]",
    },
    CommandHelp {
        name: "history",
        aliases: &["hist"],
        brief: "Show the conversation",
        usage: "/history",
    },
    CommandHelp {
        name: "clear",
        aliases: &[],
        brief: "Clear the conversation and the loaded file",
        usage: "/clear",
    },
    CommandHelp {
        name: "cancel",
        aliases: &[],
        brief: "Cancel pending requests",
        usage: "/cancel",
    },
    CommandHelp {
        name: "help",
        aliases: &["h", "?"],
        brief: "Show help",
        usage: "/help [command]",
    },
    CommandHelp {
        name: "quit",
        aliases: &["q", "exit"],
        brief: "Exit the REPL",
        usage: "/quit",
    },
];

/// Tab completion for slash commands.
struct CommandCompleter;

impl CommandCompleter {
    const COMMANDS: &'static [&'static str] = &[
        "/agent", "/cancel", "/clear", "/code", "/file", "/help", "/history", "/mentions",
        "/quit", "/upload",
    ];
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let prefix = &line[..pos];
        let matches: Vec<Pair> = Self::COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Slash commands available in the REPL.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Load a file, or show the loaded one
    File(Option<String>),
    /// Run a command against a file
    Upload { path: String, command: String },
    /// `@dev-agent` command with the loaded file, never reclassified
    Agent(String),
    /// Custom command with the loaded file
    Code(String),
    /// List mentions in the loaded file, or run the nth
    Mentions(Option<usize>),
    /// Show the conversation
    History,
    /// Clear the conversation
    Clear,
    /// Cancel pending requests
    Cancel,
    /// Show help (optionally for a specific command)
    Help(Option<String>),
    /// Quit the REPL
    Quit,
    /// A known command used wrongly
    Usage(&'static str),
    /// Unknown command
    Unknown(String),
    /// Plain text (not a command)
    Text(String),
}

impl ReplCommand {
    /// Parses input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        let Some(stripped) = input.strip_prefix('/') else {
            return ReplCommand::Text(input.to_string());
        };

        let parts: Vec<&str> = stripped.splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let arg = parts
            .get(1)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        match cmd.as_str() {
            "file" | "f" => ReplCommand::File(arg),
            "upload" | "u" => Self::parse_upload(arg),
            "agent" | "a" => arg
                .map(ReplCommand::Agent)
                .unwrap_or(ReplCommand::Usage("/agent <command>")),
            "code" => arg
                .map(ReplCommand::Code)
                .unwrap_or(ReplCommand::Usage("/code <text>")),
            "mentions" | "m" => match arg {
                None => ReplCommand::Mentions(None),
                Some(n) => n
                    .parse()
                    .map(|n| ReplCommand::Mentions(Some(n)))
                    .unwrap_or(ReplCommand::Usage("/mentions [n]")),
            },
            "history" | "hist" => ReplCommand::History,
            "clear" => ReplCommand::Clear,
            "cancel" => ReplCommand::Cancel,
            "help" | "h" | "?" => ReplCommand::Help(arg),
            "quit" | "q" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(cmd),
        }
    }

    fn parse_upload(arg: Option<String>) -> Self {
        const USAGE: &str = "/upload <path> <command>";

        let Some(arg) = arg else {
            return ReplCommand::Usage(USAGE);
        };
        match arg.split_once(char::is_whitespace) {
            Some((path, command)) if !command.trim().is_empty() => ReplCommand::Upload {
                path: path.to_string(),
                command: command.trim().to_string(),
            },
            _ => ReplCommand::Usage(USAGE),
        }
    }
}

/// REPL state
pub struct Repl {
    editor: Editor<CommandCompleter, DefaultHistory>,
    session: AgentSession,
    runtime: tokio::runtime::Runtime,
    history_path: PathBuf,
}

impl Repl {
    /// Creates a new REPL instance.
    pub fn new(settings: AgentSettings) -> commands::Result<Self> {
        let config = rustyline::Config::builder()
            .completion_type(rustyline::CompletionType::List)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CommandCompleter));

        let runtime = tokio::runtime::Runtime::new()?;
        let session = {
            let _guard = runtime.enter();
            AgentSession::new(settings)
        };

        let history_path = history_file();
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }

        Ok(Self {
            editor,
            session,
            runtime,
            history_path,
        })
    }

    /// Runs the REPL loop.
    pub fn run(&mut self) -> commands::Result<()> {
        println!("Dev Agent REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("{}", WELCOME_MESSAGE);
        println!("Type /help for commands, /quit to exit");
        println!();

        loop {
            let prompt = self.prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    self.editor.add_history_entry(&line)?;

                    let cmd = ReplCommand::parse(&line);
                    debug!(?cmd, "parsed command");

                    match self.handle_command(cmd) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!("^D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = self.editor.save_history(&self.history_path);

        println!("Goodbye!");
        Ok(())
    }

    /// Returns the prompt string.
    fn prompt(&self) -> String {
        match self.runtime.block_on(self.session.current_file()) {
            Some(file) => format!("dev-agent [{}]> ", file.file_name()),
            None => "dev-agent> ".to_string(),
        }
    }

    /// Handles a REPL command. Returns Ok(true) if should quit.
    fn handle_command(&mut self, cmd: ReplCommand) -> commands::Result<bool> {
        match cmd {
            ReplCommand::Text(text) => {
                if !text.is_empty() {
                    let ticket = self.runtime.block_on(self.session.submit(text))?;
                    self.wait_for_reply(ticket);
                }
            }

            ReplCommand::File(Some(path)) => {
                let path = expand_path(&path);
                let content = read_file(Path::new(&path))?;
                let file = self
                    .runtime
                    .block_on(self.session.set_current_file(path, content));
                println!("File loaded: {}", file.file_name());
            }

            ReplCommand::File(None) => match self.runtime.block_on(self.session.current_file()) {
                Some(file) => println!("{} ({} bytes)", file.path, file.content.len()),
                None => println!("No file loaded. Use /file <path>."),
            },

            ReplCommand::Upload { path, command } => {
                let path = PathBuf::from(expand_path(&path));
                let content = read_file(&path)?;
                let ticket = self.runtime.block_on(self.session.submit_upload(
                    file_name(&path),
                    content,
                    command,
                ))?;
                self.wait_for_reply(ticket);
            }

            ReplCommand::Agent(command) => {
                let file = self.runtime.block_on(self.session.current_file());
                let ticket = self
                    .runtime
                    .block_on(self.session.submit_command(command, file))?;
                self.wait_for_reply(ticket);
            }

            ReplCommand::Code(text) => {
                let file = self.runtime.block_on(self.session.current_file());
                let ticket = self
                    .runtime
                    .block_on(self.session.submit_code(text, file))?;
                self.wait_for_reply(ticket);
            }

            ReplCommand::Mentions(pick) => self.handle_mentions(pick)?,

            ReplCommand::History => {
                let snapshot = self.runtime.block_on(self.session.snapshot());
                for message in &snapshot.history {
                    let label = match message.role() {
                        MessageRole::User => "you",
                        MessageRole::Agent => "agent",
                        MessageRole::System => "system",
                    };
                    println!(
                        "[{} {}] {}",
                        message.timestamp().format("%H:%M:%S"),
                        label,
                        message.content()
                    );
                }
                if snapshot.history.is_empty() {
                    println!("History is empty.");
                }
            }

            ReplCommand::Clear => {
                self.runtime.block_on(self.session.clear());
                println!("Chat cleared.");
            }

            ReplCommand::Cancel => {
                self.runtime.block_on(self.session.cancel());
                println!("Pending requests cancelled.");
            }

            ReplCommand::Help(topic) => print_help(topic.as_deref()),

            ReplCommand::Quit => return Ok(true),

            ReplCommand::Usage(usage) => println!("Usage: {}", usage),

            ReplCommand::Unknown(cmd) => {
                println!(
                    "Unknown command: /{}. Type /help for available commands.",
                    cmd
                );
            }
        }

        Ok(false)
    }

    fn handle_mentions(&mut self, pick: Option<usize>) -> commands::Result<()> {
        let Some(file) = self.runtime.block_on(self.session.current_file()) else {
            println!("No file loaded. Use /file <path> first.");
            return Ok(());
        };

        let mentions = find_mentions(&file.content);
        let mention = match select_mention(&mentions, pick)? {
            Some(mention) => mention.clone(),
            None if mentions.is_empty() => {
                println!("No @dev-agent mentions found in {}", file.file_name());
                return Ok(());
            }
            None => {
                for line in format_mentions(&file.content, &mentions) {
                    println!("{}", line);
                }
                println!("Use /mentions <n> to run one.");
                return Ok(());
            }
        };

        let ticket = self.runtime.block_on(self.session.submit_mention(
            mention.command,
            file.content,
            file.path,
        ))?;
        self.wait_for_reply(ticket);
        Ok(())
    }

    /// Block until the reply arrives; Ctrl+C cancels the request.
    fn wait_for_reply(&self, ticket: RequestTicket) {
        debug!(request_id = %ticket.request_id(), "waiting for reply");
        let session = &self.session;
        let outcome = self.runtime.block_on(async {
            tokio::select! {
                result = ticket.wait() => Some(result),
                _ = tokio::signal::ctrl_c() => {
                    session.cancel().await;
                    None
                }
            }
        });

        match outcome {
            Some(Ok(reply)) => println!("{}\n", reply),
            Some(Err(e)) if e.is_cancelled() => println!("Cancelled.\n"),
            Some(Err(e)) => println!("Error: {}\n", e),
            None => println!("^C cancelled.\n"),
        }
    }
}

fn find_command_help(name: &str) -> Option<&'static CommandHelp> {
    let name_lower = name.trim_start_matches('/').to_lowercase();
    COMMAND_HELP
        .iter()
        .find(|h| h.name == name_lower || h.aliases.contains(&name_lower.as_str()))
}

/// Prints help information.
fn print_help(topic: Option<&str>) {
    match topic {
        Some(cmd) => match find_command_help(cmd) {
            Some(help) => {
                println!("/{} - {}", help.name, help.brief);
                if !help.aliases.is_empty() {
                    println!("Aliases: {}", help.aliases.join(", "));
                }
                println!("Usage: {}", help.usage);
            }
            None => println!(
                "Unknown command: {}. Type /help for available commands.",
                cmd
            ),
        },
        None => {
            println!("Dev Agent REPL");
            println!();
            println!("Type a question to send it to the agent, with the loaded file as context.");
            println!("Prefix with @dev-agent to address the agent explicitly.");
            println!("Ctrl+C while waiting cancels the request.");
            println!();
            println!("COMMANDS:");
            for help in COMMAND_HELP {
                println!("    {:<28} {}", help.usage, help.brief);
            }
            println!();
            println!("Type /help <command> for detailed help on a specific command.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        assert_eq!(
            ReplCommand::parse("explain this"),
            ReplCommand::Text("explain this".to_string())
        );
        assert_eq!(
            ReplCommand::parse("@dev-agent explain this"),
            ReplCommand::Text("@dev-agent explain this".to_string())
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ReplCommand::parse(""), ReplCommand::Text(String::new()));
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Text(String::new()));
    }

    #[test]
    fn test_parse_file() {
        assert_eq!(
            ReplCommand::parse("/file src/main.py"),
            ReplCommand::File(Some("src/main.py".to_string()))
        );
        assert_eq!(ReplCommand::parse("/f"), ReplCommand::File(None));
    }

    #[test]
    fn test_parse_upload() {
        assert_eq!(
            ReplCommand::parse("/upload notes.py summarize this file"),
            ReplCommand::Upload {
                path: "notes.py".to_string(),
                command: "summarize this file".to_string(),
            }
        );
        assert!(matches!(
            ReplCommand::parse("/upload notes.py"),
            ReplCommand::Usage(_)
        ));
        assert!(matches!(ReplCommand::parse("/upload"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_parse_agent() {
        assert_eq!(
            ReplCommand::parse("/agent explain this"),
            ReplCommand::Agent("explain this".to_string())
        );
        assert_eq!(
            ReplCommand::parse("/a summarize"),
            ReplCommand::Agent("summarize".to_string())
        );
        assert!(matches!(ReplCommand::parse("/agent"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(
            ReplCommand::parse("/code print(1)"),
            ReplCommand::Code("print(1)".to_string())
        );
        assert!(matches!(ReplCommand::parse("/code"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_parse_mentions() {
        assert_eq!(ReplCommand::parse("/mentions"), ReplCommand::Mentions(None));
        assert_eq!(ReplCommand::parse("/m 2"), ReplCommand::Mentions(Some(2)));
        assert!(matches!(
            ReplCommand::parse("/mentions two"),
            ReplCommand::Usage(_)
        ));
    }

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(ReplCommand::parse("/history"), ReplCommand::History);
        assert_eq!(ReplCommand::parse("/clear"), ReplCommand::Clear);
        assert_eq!(ReplCommand::parse("/cancel"), ReplCommand::Cancel);
    }

    #[test]
    fn test_parse_quit() {
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/q"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/exit"), ReplCommand::Quit);
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help(None));
        assert_eq!(ReplCommand::parse("/?"), ReplCommand::Help(None));
        assert_eq!(
            ReplCommand::parse("/help upload"),
            ReplCommand::Help(Some("upload".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            ReplCommand::parse("/foobar"),
            ReplCommand::Unknown("foobar".to_string())
        );
    }

    #[test]
    fn test_find_command_help() {
        assert_eq!(find_command_help("file").unwrap().name, "file");
        assert_eq!(find_command_help("/u").unwrap().name, "upload");
        assert_eq!(find_command_help("hist").unwrap().name, "history");
        assert!(find_command_help("connect").is_none());
    }
}
