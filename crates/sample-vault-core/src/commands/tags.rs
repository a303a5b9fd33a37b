use super::{open_sha256, Command, Context};
use crate::error::{Error, Result};
use clap::{Arg, ArgGroup, ArgMatches};

pub struct Tags;

fn not_stored() -> Error {
    Error::NotFound(
        "The opened file is not stored in the database. Use `store` to add it".to_string(),
    )
}

impl Command for Tags {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn description(&self) -> &'static str {
        "Modify tags of the opened file"
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
                    .value_name("TAGS")
                    .help("Add tags to the opened file (comma separated)"),
            )
            .arg(
                Arg::new("delete")
                    .short('d')
                    .long("delete")
                    .value_name("TAG")
                    .help("Delete a tag from the opened file"),
            )
            .group(
                ArgGroup::new("action")
                    .args(["add", "delete"])
                    .required(true)
                    .multiple(true),
            )
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        let sha256 = open_sha256(ctx)?;
        if !ctx.session.require_open()?.is_stored() {
            return Err(not_stored());
        }

        if let Some(tags) = args.get_one::<String>("add") {
            ctx.vault.catalog.add_tags(&sha256, tags)?;
            ctx.out.info("Tags added to the currently opened file");
        }

        if let Some(tag) = args.get_one::<String>("delete") {
            if ctx.vault.catalog.delete_tag(&sha256, tag)? {
                ctx.out.info(format!("Tag \"{}\" removed", tag));
            } else {
                ctx.out
                    .warning(format!("Tag \"{}\" is not set on the opened file", tag));
            }
        }

        ctx.out.info("Refreshing session to update attributes...");
        ctx.session.refresh(ctx.vault)?;
        Ok(())
    }
}
