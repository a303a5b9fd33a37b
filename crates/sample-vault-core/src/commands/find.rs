use super::{Command, Context, Table};
use crate::error::Result;
use crate::storage::{FindKey, Sample};
use clap::{Arg, ArgAction, ArgMatches};

pub struct Find;

/// Numbered result listing; the numbers are what `open -l` takes.
pub(super) fn results_table(samples: &[Sample]) -> Table {
    let mut table = Table::new(["#", "Name", "Type", "Tags", "Created", "SHA256"]);
    for (n, sample) in samples.iter().enumerate() {
        table.push([
            (n + 1).to_string(),
            sample.name.clone(),
            sample.file_type.clone(),
            sample.tags.join(","),
            sample.created_at.clone(),
            sample.sha256.clone(),
        ]);
    }
    table
}

impl Command for Find {
    fn name(&self) -> &'static str {
        "find"
    }

    fn description(&self) -> &'static str {
        "Find a file"
    }

    fn args(&self) -> clap::Command {
        clap::Command::new(self.name())
            .arg(
                Arg::new("tags")
                    .short('t')
                    .long("tags")
                    .action(ArgAction::SetTrue)
                    .help("List available tags and exit"),
            )
            .arg(
                Arg::new("key")
                    .required_unless_present("tags")
                    .value_parser(FindKey::NAMES)
                    .ignore_case(true)
                    .help("Search key"),
            )
            .arg(
                Arg::new("value")
                    .num_args(0..)
                    .help("Search value; may be omitted for \"all\""),
            )
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        if args.get_flag("tags") {
            let tags = ctx.vault.catalog.list_tags()?;
            if tags.is_empty() {
                ctx.out.info("No tags available");
                return Ok(());
            }
            let mut table = Table::new(["Tag", "# Entries"]);
            for tag in tags {
                table.push([tag.tag, tag.count.to_string()]);
            }
            ctx.out.table(table);
            return Ok(());
        }

        let key = args
            .get_one::<String>("key")
            .map(String::as_str)
            .unwrap_or("all");
        let value = args
            .get_many::<String>("value")
            .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        if !key.eq_ignore_ascii_case("all") && value.trim().is_empty() {
            ctx.out
                .warning(format!("Search key \"{}\" needs a value", key));
            return Ok(());
        }

        let samples = ctx.vault.catalog.find(key, &value)?;
        if samples.is_empty() {
            ctx.out.info("No matching samples");
        } else {
            ctx.out.table(results_table(&samples));
        }
        ctx.session.record_find_results(samples);
        Ok(())
    }
}
