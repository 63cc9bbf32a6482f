use super::{
    first_line, read_input, truncate, EntryBodyArgs, EntryCommands, EntryCreateArgs,
    EntryDeleteArgs, EntryGetArgs, EntryLinksArgs, EntryListArgs, EntryPathArgs, EntryTitleArgs,
    EntryVisibilityArgs, FormatArgs,
};
use anyhow::Result;
use entrydesk_client::AdminApi;
use entrydesk_core::{placeholder_title, EntryList, EntryRow, PageOutcome, Visibility};
use tracing::{debug, warn};

pub async fn run(cmd: EntryCommands, api: &dyn AdminApi) -> Result<()> {
    match cmd {
        EntryCommands::List(args) => list(args, api).await,
        EntryCommands::Get(args) => get(args, api).await,
        EntryCommands::Titles(args) => titles(args, api).await,
        EntryCommands::Create(args) => create(args, api).await,
        EntryCommands::Delete(args) => delete(args, api).await,
        EntryCommands::Title(args) => title(args, api).await,
        EntryCommands::Body(args) => body(args, api).await,
        EntryCommands::Visibility(args) => visibility(args, api).await,
        EntryCommands::RegenerateImage(args) => regenerate_image(args, api).await,
        EntryCommands::Links(args) => links(args, api).await,
    }
}

/// Page through the listing until enough rows match or it runs out.
pub async fn collect_rows(
    api: &dyn AdminApi,
    keyword: Option<&str>,
    all: bool,
    limit: usize,
) -> Vec<EntryRow> {
    let mut list = EntryList::new();
    if let Some(keyword) = keyword {
        list.set_keyword(keyword);
    }

    while let Some(page) = list.next_page() {
        match api.latest_entries(page.cursor).await {
            Ok(rows) => {
                if let PageOutcome::Appended(n) = list.apply_page(page.ticket, rows) {
                    debug!("Loaded {} more entries", n);
                }
            }
            Err(e) => {
                warn!("Failed to load entries: {}", e);
                list.fail_page(page.ticket);
            }
        }
        if !all && list.visible().len() >= limit {
            break;
        }
    }

    list.visible().into_iter().take(limit).cloned().collect()
}

async fn list(args: EntryListArgs, api: &dyn AdminApi) -> Result<()> {
    let rows = collect_rows(api, args.keyword.as_deref(), args.all, args.limit).await;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("(no entries found)");
        return Ok(());
    }

    println!("{:<24}  {:<32}  {:<8}  {:<17}  {}", "PATH", "TITLE", "VIS", "EDITED", "PREVIEW");
    println!("{}", "─".repeat(110));
    for row in &rows {
        println!(
            "{:<24}  {:<32}  {:<8}  {:<17}  {}",
            truncate(row.path.as_deref().unwrap_or("-"), 24),
            truncate(row.title.as_deref().unwrap_or("-"), 32),
            row.visibility.unwrap_or_default().as_str(),
            row.last_edited_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            truncate(first_line(row.body.as_deref().unwrap_or("")), 30),
        );
    }
    Ok(())
}

async fn get(args: EntryGetArgs, api: &dyn AdminApi) -> Result<()> {
    let entry = api.get_entry(&args.path).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    println!("Path:       {}", entry.path);
    println!("Title:      {}", entry.title);
    println!("Visibility: {}", entry.visibility);
    println!("Format:     {}", entry.format);
    if let Some(url) = &entry.image_url {
        println!("Image:      {}", url);
    }
    println!();
    println!("{}", entry.body);
    Ok(())
}

async fn titles(args: FormatArgs, api: &dyn AdminApi) -> Result<()> {
    let titles = api.entry_titles().await?;
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&titles)?);
    } else {
        for title in &titles {
            println!("{}", title);
        }
    }
    Ok(())
}

async fn create(args: EntryCreateArgs, api: &dyn AdminApi) -> Result<()> {
    let title = args
        .title
        .unwrap_or_else(|| placeholder_title(&chrono::Local::now()));
    let created = api.create_entry(&title).await.map_err(|e| {
        warn!("Error creating new entry: {}", e);
        anyhow::anyhow!("Failed to create new entry: {}", e)
    })?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        println!("Created entry {} ({})", created.path, created.title.as_deref().unwrap_or(&title));
    }
    Ok(())
}

async fn delete(args: EntryDeleteArgs, api: &dyn AdminApi) -> Result<()> {
    if !args.yes {
        use inquire::Confirm;
        let confirmed = Confirm::new(&format!("Delete entry {}?", args.path))
            .with_default(false)
            .prompt()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    api.delete_entry(&args.path).await?;
    println!("Entry deleted successfully");
    Ok(())
}

async fn title(args: EntryTitleArgs, api: &dyn AdminApi) -> Result<()> {
    if args.title.is_empty() {
        anyhow::bail!("Title cannot be empty");
    }
    api.update_title(&args.path, &args.title).await?;
    println!("Updated");
    Ok(())
}

async fn body(args: EntryBodyArgs, api: &dyn AdminApi) -> Result<()> {
    let body = read_input(args.file.as_deref())?;
    if body.is_empty() {
        anyhow::bail!("Body cannot be empty");
    }
    api.update_body(&args.path, &body).await?;
    println!("Updated");
    Ok(())
}

async fn visibility(args: EntryVisibilityArgs, api: &dyn AdminApi) -> Result<()> {
    let requested: Visibility = args.visibility.parse()?;
    let visibility = api.update_visibility(&args.path, requested).await?;
    println!("Visibility of {} is now {}", args.path, visibility);
    Ok(())
}

async fn regenerate_image(args: EntryPathArgs, api: &dyn AdminApi) -> Result<()> {
    api.regenerate_entry_image(&args.path).await?;
    println!("Entry image regenerated successfully");
    Ok(())
}

async fn links(args: EntryLinksArgs, api: &dyn AdminApi) -> Result<()> {
    let linked = api.linked_entry_paths(&args.path).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&linked)?);
        return Ok(());
    }

    if linked.is_empty() {
        println!("(no links)");
        return Ok(());
    }
    println!("{:<40}  {}", "TITLE", "PATH");
    println!("{}", "─".repeat(70));
    for (title, path) in &linked {
        println!(
            "{:<40}  {}",
            truncate(title, 40),
            path.as_deref().unwrap_or("(no entry)")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrydesk_client::MemoryAdminApi;
    use entrydesk_core::Entry;

    #[tokio::test]
    async fn test_collect_rows_filters_and_limits() {
        let api = MemoryAdminApi::new();
        for i in 0..150 {
            let title = if i % 10 == 0 { format!("Rust note {}", i) } else { format!("Note {}", i) };
            api.insert(Entry::new(format!("n{}", i), title, "text"));
        }

        let rows = collect_rows(&api, None, false, 20).await;
        assert_eq!(rows.len(), 20);

        let rust = collect_rows(&api, Some("RUST"), true, usize::MAX).await;
        assert_eq!(rust.len(), 15);

        let everything = collect_rows(&api, None, true, usize::MAX).await;
        assert_eq!(everything.len(), 150);
    }
}
