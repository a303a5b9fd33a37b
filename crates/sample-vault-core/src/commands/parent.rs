use super::{open_sha256, Command, Context};
use crate::error::{Error, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches};

pub struct Parent;

impl Command for Parent {
    fn name(&self) -> &'static str {
        "parent"
    }

    fn description(&self) -> &'static str {
        "Add or remove a parent file"
    }

    fn needs_session(&self) -> bool {
        true
    }

    fn args(&self) -> clap::Command {
        clap::Command::new(self.name())
            .arg(
                Arg::new("add")
                    .short('a')
                    .long("add")
                    .value_name("SHA256")
                    .help("Add parent file by sha256"),
            )
            .arg(
                Arg::new("delete")
                    .short('d')
                    .long("delete")
                    .action(ArgAction::SetTrue)
                    .help("Delete parent"),
            )
            .arg(
                Arg::new("open")
                    .short('o')
                    .long("open")
                    .action(ArgAction::SetTrue)
                    .help("Open parent file"),
            )
            .group(
                ArgGroup::new("action")
                    .args(["add", "delete", "open"])
                    .required(true)
                    .multiple(true),
            )
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        let sha256 = open_sha256(ctx)?;
        if !ctx.session.require_open()?.is_stored() {
            return Err(Error::NotFound(
                "The opened file is not stored in the database. Use `store` to add it"
                    .to_string(),
            ));
        }

        if let Some(parent) = args.get_one::<String>("add") {
            ctx.vault.catalog.add_parent(&sha256, parent)?;
            ctx.out.info("Parent added to the currently opened file");
            ctx.session.refresh(ctx.vault)?;
        }

        if args.get_flag("delete") {
            ctx.vault.catalog.delete_parent(&sha256)?;
            ctx.out.info("Parent removed from the currently opened file");
            ctx.session.refresh(ctx.vault)?;
        }

        if args.get_flag("open") {
            match ctx.session.require_open()?.parent.clone() {
                Some(parent) => {
                    let path = ctx.session.open_hash(ctx.vault, &parent)?.path.clone();
                    ctx.out
                        .info(format!("Session opened on {}", path.display()));
                }
                None => ctx.out.info("No parent set for the opened file"),
            }
        }
        Ok(())
    }
}
