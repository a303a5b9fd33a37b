//! Typed command registry shared by the console and any other line-oriented
//! front end.
//!
//! A command line goes through three phases: it is split into words, the
//! words are parsed against the command's clap grammar, and the handler runs
//! with a [`Context`] bound to the caller's session. Parse failures become
//! [`Outcome::UsageError`] without running anything; handler failures (errors
//! or panics) become [`Outcome::HandlerError`] and are logged once.

pub mod lexer;
pub mod output;

mod close;
mod delete;
mod find;
mod info;
mod latest;
mod open;
mod parent;
mod store;
mod tags;

pub use output::{Entry, Level, Output, Table};

use crate::error::Result;
use crate::progress::{ProgressReporter, SilentReporter};
use crate::session::{Fetcher, NoFetcher, Session};
use crate::vault::Vault;
use clap::error::ErrorKind;
use clap::ArgMatches;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// A named console command with its own argument grammar.
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Argument grammar. The returned command is parsed without a binary
    /// name, so the words after the command name are matched directly.
    fn args(&self) -> clap::Command {
        clap::Command::new(self.name())
    }

    /// Whether the command operates on the open sample. Only used for help;
    /// handlers check the session themselves.
    fn needs_session(&self) -> bool {
        false
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()>;
}

fn deny(_prompt: &str) -> bool {
    false
}

static SILENT: SilentReporter = SilentReporter;
static NO_FETCHER: NoFetcher = NoFetcher;

/// What a handler gets to work with: the shared vault, the caller's session
/// and the caller's collaborators.
pub struct Context<'a> {
    pub vault: &'a Vault,
    pub session: &'a mut Session,
    pub fetcher: &'a dyn Fetcher,
    pub reporter: &'a dyn ProgressReporter,
    /// Asks the user a yes/no question. Non-interactive callers answer no.
    pub confirm: &'a dyn Fn(&str) -> bool,
    pub out: Output,
}

impl<'a> Context<'a> {
    pub fn new(vault: &'a Vault, session: &'a mut Session) -> Self {
        Self {
            vault,
            session,
            fetcher: &NO_FETCHER,
            reporter: &SILENT,
            confirm: &deny,
            out: Output::new(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: &'a dyn Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_confirm(mut self, confirm: &'a dyn Fn(&str) -> bool) -> Self {
        self.confirm = confirm;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Blank line; nothing ran.
    Empty,
    Success,
    UnknownCommand(String),
    UsageError(String),
    HandlerError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::Empty)
    }
}

#[derive(Default)]
pub struct Registry {
    commands: Vec<Box<dyn Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(open::Open));
        registry.register(Box::new(close::Close));
        registry.register(Box::new(info::Info));
        registry.register(Box::new(store::Store));
        registry.register(Box::new(delete::Delete));
        registry.register(Box::new(find::Find));
        registry.register(Box::new(tags::Tags));
        registry.register(Box::new(parent::Parent));
        registry.register(Box::new(latest::Latest));
        registry
    }

    /// Adds a command, replacing any command registered under the same name.
    pub fn register(&mut self, command: Box<dyn Command>) {
        match self
            .commands
            .iter_mut()
            .find(|c| c.name() == command.name())
        {
            Some(slot) => *slot = command,
            None => self.commands.push(command),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.iter().map(|c| c.name()).collect();
        names.push("help");
        names
    }

    fn grammar(command: &dyn Command) -> clap::Command {
        command
            .args()
            .about(command.description())
            .no_binary_name(true)
            .disable_version_flag(true)
    }

    pub fn dispatch(&self, line: &str, ctx: &mut Context<'_>) -> Outcome {
        let words = match lexer::split_line(line) {
            Ok(words) => words,
            Err(e) => {
                ctx.out.error(e.clone());
                return Outcome::UsageError(e);
            }
        };
        let Some((name, rest)) = words.split_first() else {
            return Outcome::Empty;
        };

        if name == "help" {
            return self.help(rest, ctx);
        }

        let Some(command) = self.get(name) else {
            ctx.out
                .error(format!("Unknown command {:?}, try \"help\"", name));
            return Outcome::UnknownCommand(name.clone());
        };

        let matches = match Self::grammar(command).try_get_matches_from(rest) {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                ctx.out.info(e.render().to_string().trim_end());
                return Outcome::Success;
            }
            Err(e) => {
                let usage = e.render().to_string().trim_end().to_string();
                ctx.out.error(usage.clone());
                return Outcome::UsageError(usage);
            }
        };

        debug!("Running command {}", name);
        match panic::catch_unwind(AssertUnwindSafe(|| command.run(ctx, &matches))) {
            Ok(Ok(())) => Outcome::Success,
            Ok(Err(e)) if e.is_recoverable() => {
                warn!("{}: {}", name, e);
                ctx.out.warning(e.to_string());
                Outcome::HandlerError(e.to_string())
            }
            Ok(Err(e)) => {
                error!("{}: {}", name, e);
                ctx.out.error(e.to_string());
                Outcome::HandlerError(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("{} panicked: {}", name, message);
                ctx.out
                    .error(format!("The command {} failed: {}", name, message));
                Outcome::HandlerError(message)
            }
        }
    }

    fn help(&self, rest: &[String], ctx: &mut Context<'_>) -> Outcome {
        if let Some(topic) = rest.first() {
            return match self.get(topic) {
                Some(command) => {
                    let help = Self::grammar(command).render_long_help().to_string();
                    ctx.out.info(help.trim_end());
                    Outcome::Success
                }
                None => {
                    let message = format!("No help for unknown command {:?}", topic);
                    ctx.out.error(message.clone());
                    Outcome::UsageError(message)
                }
            };
        }

        let mut table = Table::new(["Command", "Description", "Needs open file"]);
        for command in &self.commands {
            let needs = if command.needs_session() { "yes" } else { "" };
            table.push([command.name(), command.description(), needs]);
        }
        table.push(["help", "Show this help message", ""]);
        ctx.out.info("Commands:");
        ctx.out.table(table);
        Outcome::Success
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Shared helper: the open sample's sha256, or `SessionRequired`.
fn open_sha256(ctx: &Context<'_>) -> Result<String> {
    Ok(ctx.session.require_open()?.file.sha256.clone())
}
