use super::{Command, Context};
use crate::error::{Error, Result};
use crate::scanner::ImportFilter;
use clap::{value_parser, Arg, ArgAction, ArgMatches};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Store;

impl Store {
    fn store_folder(ctx: &mut Context<'_>, args: &ArgMatches, folder: &Path) -> Result<()> {
        if !folder.is_dir() {
            return Err(Error::SourceUnavailable(format!(
                "You specified an invalid folder: {}",
                folder.display()
            )));
        }

        let filter = ImportFilter {
            file_name: args.get_one::<String>("file-name").cloned(),
            file_type: args.get_one::<String>("file-type").cloned(),
            max_size: args.get_one::<u64>("file-size").copied(),
        };
        let tags = args.get_one::<String>("tags").map(String::as_str);

        let summary = ctx.vault.import_folder(
            folder,
            &filter,
            tags,
            args.get_flag("delete"),
            ctx.reporter,
        )?;

        for path in &summary.too_big {
            ctx.out
                .warning(format!("Skip, file \"{}\" is too big", path.display()));
        }
        for name in &summary.already_stored {
            ctx.out
                .warning(format!("Skip, file \"{}\" appears to be already stored", name));
        }
        for (name, path) in &summary.stored {
            ctx.out
                .success(format!("Stored file \"{}\" to {}", name, path.display()));
        }
        for (path, reason) in &summary.failed {
            ctx.out.error(format!("{}: {}", path.display(), reason));
        }
        ctx.out.info(format!(
            "Stored {} new files, {} already stored, {} filtered by type",
            summary.stored.len(),
            summary.already_stored.len(),
            summary.type_mismatch
        ));
        Ok(())
    }

    fn store_session(ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        let snapshot = ctx.session.require_open()?.clone();
        let file = &snapshot.file;

        if file.size == 0 {
            ctx.out.warning("Skip, file appears to be empty");
            return Ok(());
        }

        let tags = args.get_one::<String>("tags").map(String::as_str);
        let ingest = ctx.vault.ingest_file(file, &snapshot.path, tags)?;
        if !ingest.is_new() {
            ctx.out.warning(format!(
                "Skip, file \"{}\" appears to be already stored",
                file.name
            ));
            return Ok(());
        }
        ctx.out.success(format!(
            "Stored file \"{}\" to {}",
            file.name,
            ingest.path().display()
        ));

        if args.get_flag("delete") && snapshot.path != ingest.path() {
            if let Err(e) = fs::remove_file(&snapshot.path) {
                ctx.out.error(format!(
                    "Failed deleting {}: {}",
                    snapshot.path.display(),
                    e
                ));
            }
        }

        ctx.session.open_hash(ctx.vault, &ingest.sha256)?;
        ctx.out
            .info(format!("Session opened on {}", ingest.path().display()));
        Ok(())
    }
}

impl Command for Store {
    fn name(&self) -> &'static str {
        "store"
    }

    fn description(&self) -> &'static str {
        "Store the opened file to the local repository"
    }

    fn args(&self) -> clap::Command {
        clap::Command::new(self.name())
            .arg(
                Arg::new("delete")
                    .short('d')
                    .long("delete")
                    .action(ArgAction::SetTrue)
                    .help("Delete the original file"),
            )
            .arg(
                Arg::new("folder")
                    .short('f')
                    .long("folder")
                    .value_name("DIR")
                    .value_parser(value_parser!(PathBuf))
                    .help("Specify a folder to import"),
            )
            .arg(
                Arg::new("file-size")
                    .short('s')
                    .long("file-size")
                    .value_name("BYTES")
                    .value_parser(value_parser!(u64))
                    .requires("folder")
                    .help("Specify a maximum file size"),
            )
            .arg(
                Arg::new("file-type")
                    .short('y')
                    .long("file-type")
                    .value_name("PATTERN")
                    .requires("folder")
                    .help("Specify a file type pattern"),
            )
            .arg(
                Arg::new("file-name")
                    .short('n')
                    .long("file-name")
                    .value_name("GLOB")
                    .requires("folder")
                    .help("Specify a file name pattern"),
            )
            .arg(
                Arg::new("tags")
                    .short('t')
                    .long("tags")
                    .value_name("TAGS")
                    .help("Specify a list of comma-separated tags"),
            )
    }

    fn run(&self, ctx: &mut Context<'_>, args: &ArgMatches) -> Result<()> {
        match args.get_one::<PathBuf>("folder") {
            Some(folder) => Self::store_folder(ctx, args, folder),
            None => Self::store_session(ctx, args),
        }
    }
}
