use super::{Command, Context};
use crate::error::Result;
use clap::ArgMatches;

pub struct Close;

impl Command for Close {
    fn name(&self) -> &'static str {
        "close"
    }

    fn description(&self) -> &'static str {
        "Close the current session"
    }

    fn run(&self, ctx: &mut Context<'_>, _args: &ArgMatches) -> Result<()> {
        ctx.session.close();
        Ok(())
    }
}
