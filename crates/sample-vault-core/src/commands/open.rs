use super::{Command, Context};
use crate::error::{Error, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches};
use std::path::PathBuf;

pub struct Open;

fn expand_home(target: &str) -> PathBuf {
    match (target.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(target),
    }
}

impl Command for Open {
    fn name(&self) -> &'static str {
        "open"
    }

    fn description(&self) -> &'static str {
        "Open a file"
    }

    fn args(&self) -> clap::Command {
        clap::Command::new(self.name())
            .after_help(
                "You can specify a local file path, a URL, a hash of a stored sample, \
                 or the entry number of the last find (e.g. open -l 3)",
            )
            .arg(
                Arg::new("file")
                    .short('f')
                    .long("file")
                    .action(ArgAction::SetTrue)
                    .help("The target is a file"),
            )
            .arg(
                Arg::new("url")
                    .short('u')
                    .long("url")
                    .action(ArgAction::SetTrue)
                    .help("The target is a URL"),
            )
            .arg(
                Arg::new("last")
                    .short('l')
                    .long("last")
                    .action(ArgAction::SetTrue)
                    .help("The target is the entry number from the last find command's results"),
            )
            .arg(
                Arg::new("tor")
                    .short('t')
                    .long("tor")
                    .action(ArgAction::SetTrue)
                    .requires("url")
                    .help("Download the file through Tor"),
            )
            .group(ArgGroup::new("kind").args(["file", "url", "last"]))
            .arg(
                Arg::new("target")
                    .num_args(1..)
                    .required(true)
                    .value_name("TARGET")
                    .help("File path, URL, hash or entry number"),
            )
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        let target = args
            .get_many::<String>("target")
            .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        let opened = if args.get_flag("file") {
            let path = expand_home(&target);
            if !path.is_file() {
                return Err(Error::SourceUnavailable(format!(
                    "File not found: {}",
                    path.display()
                )));
            }
            ctx.session.open(ctx.vault, &path)
        } else if args.get_flag("url") {
            ctx.session
                .open_url(ctx.vault, ctx.fetcher, &target, args.get_flag("tor"))
        } else if args.get_flag("last") {
            let Ok(index) = target.trim().parse::<usize>() else {
                ctx.out.warning(
                    "Please pass the entry number from the last find to -l/--last (e.g. open -l 5)",
                );
                return Ok(());
            };
            match ctx.session.open_from_find_cache(ctx.vault, index) {
                Err(Error::Index(message)) => {
                    ctx.out.warning(message);
                    return Ok(());
                }
                other => other,
            }
        } else {
            ctx.session.open_hash(ctx.vault, target.trim())
        };

        let path = opened?.path.display().to_string();
        ctx.out.info(format!("Session opened on {}", path));
        Ok(())
    }
}
