use super::{Command, Context};
use crate::error::{Error, Result};
use clap::{Arg, ArgAction, ArgMatches};

pub struct Delete;

impl Command for Delete {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn description(&self) -> &'static str {
        "Delete the opened file"
    }

    fn needs_session(&self) -> bool {
        true
    }

    fn args(&self) -> clap::Command {
        clap::Command::new(self.name()).arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .action(ArgAction::SetTrue)
                .help("Do not ask for confirmation"),
        )
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        let snapshot = ctx.session.require_open()?;
        let (id, sha256) = (snapshot.id, snapshot.file.sha256.clone());

        if !args.get_flag("yes")
            && !(ctx.confirm)("Are you sure you want to delete this binary? Can't be reverted!")
        {
            ctx.out.info("Delete cancelled");
            return Ok(());
        }

        if let Some(id) = id {
            ctx.vault.catalog.delete(id)?;
        }
        match ctx.vault.repository.unlink(&sha256) {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {
                ctx.out
                    .warning("The file was not present in the local repository");
            }
            Err(e) => return Err(e),
        }

        ctx.out.success("Deleted opened file.");
        ctx.session.close();
        Ok(())
    }
}
