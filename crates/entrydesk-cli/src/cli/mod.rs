pub mod config_cmd;
pub mod edit;
pub mod entry;
pub mod links;
pub mod pallet;
pub mod upload;

use crate::config::DeskConfig;
use clap::{Args, Parser, Subcommand};
use entrydesk_client::HttpAdminClient;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "entrydesk")]
#[command(version, about = "Admin client for a wiki-style blog")]
pub struct Cli {
    /// Path to entrydesk.toml
    #[arg(
        long,
        global = true,
        env = "ENTRYDESK_CONFIG",
        default_value = "entrydesk.toml"
    )]
    pub config: PathBuf,

    /// Admin API base URL (overrides config file)
    #[arg(long, global = true, env = "ENTRYDESK_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract [[wiki links]] from a markdown file or stdin
    Links(LinksArgs),
    /// Entry operations
    #[command(subcommand)]
    Entry(EntryCommands),
    /// Show the link pallet of an entry
    Pallet(PalletArgs),
    /// Upload files and print their URLs
    Upload(UploadArgs),
    /// Edit an entry through a local file with autosave
    Edit(EditArgs),
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct LinksArgs {
    /// Markdown file (reads stdin when omitted)
    pub file: Option<PathBuf>,
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub enum EntryCommands {
    /// Latest entries, most recently edited first
    List(EntryListArgs),
    Get(EntryGetArgs),
    /// All entry titles
    Titles(FormatArgs),
    Create(EntryCreateArgs),
    Delete(EntryDeleteArgs),
    /// Rename an entry
    Title(EntryTitleArgs),
    /// Replace an entry's body
    Body(EntryBodyArgs),
    Visibility(EntryVisibilityArgs),
    /// Regenerate the entry's preview image
    RegenerateImage(EntryPathArgs),
    /// Linked titles and the paths they resolve to
    Links(EntryLinksArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Output format: table (default) | json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct EntryPathArgs {
    /// Entry path
    pub path: String,
}

#[derive(Args, Debug)]
pub struct EntryListArgs {
    /// Only show entries whose title or body contains this (case-insensitive)
    #[arg(long, short)]
    pub keyword: Option<String>,
    /// Keep paging until the listing is exhausted
    #[arg(long)]
    pub all: bool,
    /// Maximum rows to print
    #[arg(long, default_value = "50")]
    pub limit: usize,
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct EntryGetArgs {
    pub path: String,
    /// Output format: text (default) | json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct EntryCreateArgs {
    /// Title of the new entry (defaults to the current local time)
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct EntryDeleteArgs {
    pub path: String,
    /// Skip confirmation
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct EntryTitleArgs {
    pub path: String,
    pub title: String,
}

#[derive(Args, Debug)]
pub struct EntryBodyArgs {
    pub path: String,
    /// Read the body from this file instead of stdin
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EntryVisibilityArgs {
    pub path: String,
    /// public | private
    pub visibility: String,
}

#[derive(Args, Debug)]
pub struct EntryLinksArgs {
    pub path: String,
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct PalletArgs {
    pub path: String,
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub path: String,
    /// Local markdown file mirroring the entry body
    #[arg(long)]
    pub file: PathBuf,
    /// How often to check the file for changes, in milliseconds
    #[arg(long, default_value = "200")]
    pub poll_ms: u64,
    /// Push the file's existing content instead of overwriting it with the entry body
    #[arg(long)]
    pub keep_local: bool,
}

/// Build an HTTP client from the config file and the `--server` override.
pub fn connect(config: &DeskConfig, server: Option<&str>) -> anyhow::Result<HttpAdminClient> {
    let base_url = server.unwrap_or(&config.server.base_url);
    HttpAdminClient::with_timeout(base_url, config.timeout())
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client for {}: {}", base_url, e))
}

/// Read a file, or stdin when no path is given.
pub fn read_input(file: Option<&std::path::Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            use std::io::Read;
            let mut s = String::new();
            std::io::stdin().read_to_string(&mut s)?;
            Ok(s)
        }
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max - 1).collect::<String>())
    }
}

/// First line of a body, for one-line previews.
pub fn first_line(body: &str) -> &str {
    body.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_edit_command() {
        let cli = Cli::try_parse_from([
            "entrydesk",
            "--server",
            "http://localhost:1/api",
            "edit",
            "2024/01/02/030405",
            "--file",
            "draft.md",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://localhost:1/api"));
        match cli.command {
            Commands::Edit(args) => {
                assert_eq!(args.path, "2024/01/02/030405");
                assert_eq!(args.poll_ms, 200);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_truncate_and_first_line() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(first_line("\n\n  # Heading  \nmore"), "# Heading");
        assert_eq!(first_line(""), "");
    }
}
