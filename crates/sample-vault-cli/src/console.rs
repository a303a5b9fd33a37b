use colored::*;
use sample_vault_core::commands::{Entry, Level, Outcome};
use sample_vault_core::{Context, Fetcher, ProgressReporter, Registry, Session, Vault};
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

pub fn print_entries(entries: &[Entry]) {
    for entry in entries {
        match entry {
            Entry::Message { level, text } => match level {
                Level::Info => println!("{} {}", "[*]".bold(), text),
                Level::Success => println!("{} {}", "[+]".green().bold(), text),
                Level::Warning => println!("{} {}", "[!]".yellow().bold(), text),
                Level::Error => println!("{} {}", "[!]".red().bold(), text),
            },
            Entry::Table(table) => println!("{}", table.render()),
        }
    }
}

/// Quotes words so that the console lexer splits them back the same way.
pub fn shell_join(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let plain = !word.is_empty()
                && word
                    .chars()
                    .all(|c| !c.is_whitespace() && !matches!(c, '\'' | '"' | '\\'));
            if plain {
                word.clone()
            } else {
                format!("'{}'", word.replace('\'', "'\\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

fn prompt(session: &Session) -> String {
    match session.current() {
        Some(snapshot) => format!(
            "{} {} {} ",
            "vault".bold(),
            snapshot.file.name.cyan(),
            ">".bold()
        ),
        None => format!("{} {} ", "vault".bold(), ">".bold()),
    }
}

/// Interactive loop. Returns on `exit`, `quit` or end of input.
pub fn run(
    vault: &Vault,
    registry: &Registry,
    fetcher: &dyn Fetcher,
    reporter: &dyn ProgressReporter,
) -> io::Result<()> {
    let mut session = Session::new();
    let confirm = |question: &str| prompt_confirm(question, Some(false)).unwrap_or(false);
    let stdin = io::stdin();
    let mut line = String::new();

    info!("Type \"help\" to list commands, \"exit\" to quit");
    loop {
        print!("{}", prompt(&session));
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let trimmed = line.trim();
        if matches!(trimmed, "exit" | "quit") {
            break;
        }

        let mut ctx = Context::new(vault, &mut session)
            .with_fetcher(fetcher)
            .with_reporter(reporter)
            .with_confirm(&confirm);
        let outcome = registry.dispatch(trimmed, &mut ctx);
        print_entries(&ctx.out.take());
        if !outcome.is_success() {
            debug!("{:?}", outcome);
        }
    }

    session.close();
    Ok(())
}

/// Runs one command line against a fresh session. Returns whether it succeeded.
pub fn exec(
    vault: &Vault,
    registry: &Registry,
    fetcher: &dyn Fetcher,
    reporter: &dyn ProgressReporter,
    line: &str,
    json: bool,
) -> anyhow::Result<bool> {
    let mut session = Session::new();
    let mut ctx = Context::new(vault, &mut session)
        .with_fetcher(fetcher)
        .with_reporter(reporter);
    let outcome = registry.dispatch(line, &mut ctx);

    if json {
        println!("{}", serde_json::to_string_pretty(&ctx.out)?);
    } else {
        print_entries(ctx.out.entries());
    }
    Ok(matches!(outcome, Outcome::Success | Outcome::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_vault_core::commands::lexer::split_line;

    #[test]
    fn test_shell_join_round_trips_through_lexer() {
        let words: Vec<String> = ["open", "-f", "/tmp/my file.exe", "it's", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let line = shell_join(&words);
        assert_eq!(split_line(&line).unwrap(), words);
    }

    #[test]
    fn test_shell_join_leaves_plain_words() {
        let words = vec!["find".to_string(), "tag".to_string(), "mal".to_string()];
        assert_eq!(shell_join(&words), "find tag mal");
    }
}
