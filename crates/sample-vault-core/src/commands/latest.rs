use super::{find::results_table, Command, Context};
use crate::error::Result;
use clap::{value_parser, Arg, ArgMatches};

pub struct Latest;

impl Command for Latest {
    fn name(&self) -> &'static str {
        "latest"
    }

    fn description(&self) -> &'static str {
        "List the latest stored files"
    }

    fn args(&self) -> clap::Command {
        clap::Command::new(self.name()).arg(
            Arg::new("number")
                .short('n')
                .long("number")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("5")
                .help("Number of samples to list"),
        )
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        let n = args.get_one::<usize>("number").copied().unwrap_or(5);
        let samples = ctx.vault.catalog.list_latest(n)?;
        if samples.is_empty() {
            ctx.out.info("No samples stored yet");
        } else {
            ctx.out.table(results_table(&samples));
        }
        ctx.session.record_find_results(samples);
        Ok(())
    }
}
