use super::{truncate, PalletArgs};
use anyhow::Result;
use entrydesk_client::AdminApi;
use entrydesk_core::{Card, EntryCard, PalletView};

pub async fn run(args: PalletArgs, api: &dyn AdminApi) -> Result<()> {
    let data = api.link_pallet(&args.path).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    print_pallet(&PalletView::from_data(&data));
    Ok(())
}

fn entry_line(card: &EntryCard) -> String {
    format!(
        "{:<40}  {:<30}{}",
        truncate(&card.title, 40),
        truncate(&card.path, 30),
        if card.private { "  (private)" } else { "" }
    )
}

pub fn print_pallet(view: &PalletView) {
    if view.is_empty() {
        println!("(no related entries)");
        return;
    }

    if !view.direct.is_empty() {
        println!("Links");
        println!("{}", "─".repeat(80));
        for card in &view.direct {
            println!("  {}", entry_line(card));
        }
    }

    for row in &view.two_hop {
        println!();
        match &row.src {
            Card::Entry(card) => println!("▶ {}", entry_line(card)),
            Card::Create(card) => println!("▶ {}  (no entry yet)", card.title),
        }
        println!("{}", "─".repeat(80));
        for card in &row.links {
            println!("  {}", entry_line(card));
        }
    }

    if !view.new_links.is_empty() {
        println!();
        println!("New links");
        println!("{}", "─".repeat(80));
        for card in &view.new_links {
            println!("  + {}", card.title);
        }
    }
}
