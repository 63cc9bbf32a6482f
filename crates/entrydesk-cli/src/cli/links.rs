use super::{read_input, LinksArgs};
use anyhow::Result;
use entrydesk_core::LinkSet;

pub fn run(args: LinksArgs) -> Result<()> {
    let body = read_input(args.file.as_deref())?;
    let links = LinkSet::from_body(&body);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(links.titles())?);
        return Ok(());
    }

    if links.is_empty() {
        println!("(no links)");
        return Ok(());
    }
    for title in links.titles() {
        println!("[[{}]]", title);
    }
    println!("{} link(s)", links.len());
    Ok(())
}
