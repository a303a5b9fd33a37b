use super::{Command, Context, Table};
use crate::error::Result;
use clap::ArgMatches;

pub struct Info;

impl Command for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    fn description(&self) -> &'static str {
        "Show information on the opened file"
    }

    fn needs_session(&self) -> bool {
        true
    }

    fn run(&self, ctx: &mut Context<'_>, _args: &ArgMatches) -> Result<()> {
        let snapshot = ctx.session.require_open()?;
        let file = &snapshot.file;
        let children = if snapshot.is_stored() {
            ctx.vault
                .catalog
                .children(&file.sha256)?
                .into_iter()
                .map(|c| c.sha256)
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            String::new()
        };

        let mut table = Table::new(["Key", "Value"]);
        table.push(["Name".to_string(), file.name.clone()]);
        table.push(["Tags".to_string(), snapshot.tags.join(", ")]);
        table.push(["Path".to_string(), snapshot.path.display().to_string()]);
        table.push(["Size".to_string(), file.size.to_string()]);
        table.push(["Type".to_string(), file.file_type.clone()]);
        table.push(["MD5".to_string(), file.md5.clone()]);
        table.push(["SHA1".to_string(), file.sha1.clone()]);
        table.push(["SHA256".to_string(), file.sha256.clone()]);
        table.push(["SHA512".to_string(), file.sha512.clone()]);
        table.push(["SSdeep".to_string(), file.ssdeep.clone()]);
        table.push(["CRC32".to_string(), file.crc32.clone()]);
        table.push([
            "Parent".to_string(),
            snapshot.parent.clone().unwrap_or_default(),
        ]);
        table.push(["Children".to_string(), children]);
        table.push([
            "Stored".to_string(),
            if snapshot.is_stored() { "yes" } else { "no" }.to_string(),
        ]);

        ctx.out.table(table);
        Ok(())
    }
}
