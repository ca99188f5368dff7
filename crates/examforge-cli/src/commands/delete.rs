//! The `examforge delete` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::load_config_from;

pub async fn execute(id: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    config
        .storage()?
        .delete(&id)
        .await
        .with_context(|| format!("failed to delete test {id}"))?;
    println!("Deleted test {id}");
    Ok(())
}
