//! Print the generated OpenAPI document to stdout.

use anyhow::Result;
use kustos::api;

fn main() -> Result<()> {
    println!("{}", api::openapi().to_pretty_json()?);
    Ok(())
}
