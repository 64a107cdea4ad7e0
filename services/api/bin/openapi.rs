//! Writes the API's OpenAPI document, by default to `openapi.json`.

use anyhow::Context;
use interview_api::router::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize the OpenAPI document")?;
    std::fs::write(&path, document).with_context(|| format!("Failed to write {}", path))?;
    println!("OpenAPI document written to {}", path);
    Ok(())
}
