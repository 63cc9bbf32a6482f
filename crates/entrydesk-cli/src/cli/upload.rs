use super::UploadArgs;
use anyhow::{Context, Result};
use entrydesk_client::AdminApi;
use futures::future::try_join_all;
use std::path::Path;
use tracing::info;

async fn upload_one(api: &dyn AdminApi, path: &Path) -> Result<(String, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    info!("Uploading {} ({} bytes)", name, bytes.len());
    let uploaded = api
        .upload_file(&name, bytes)
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    Ok((name, uploaded.url))
}

pub async fn run(args: UploadArgs, api: &dyn AdminApi) -> Result<()> {
    let uploads = try_join_all(args.files.iter().map(|p| upload_one(api, p))).await?;

    if args.format == "json" {
        let json: Vec<_> = uploads
            .iter()
            .map(|(name, url)| serde_json::json!({ "file": name, "url": url }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    for (name, url) in &uploads {
        // Markdown image syntax, ready to paste into a body.
        println!("![{}]({})", name, url);
    }
    Ok(())
}
