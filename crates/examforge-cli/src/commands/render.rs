//! The `examforge render` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_report::{write_html_worksheet, RenderOptions};

use crate::config::load_config_from;

pub async fn execute(
    id: Option<String>,
    test_path: Option<PathBuf>,
    output: PathBuf,
    answer_key: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let test = match (id, test_path) {
        (_, Some(path)) => examforge_core::parser::parse_test(&path)?,
        (Some(id), None) => {
            let config = load_config_from(config_path.as_deref())?;
            config.storage()?.require(&id).await?
        }
        (None, None) => anyhow::bail!("either --id or --test is required"),
    };

    write_html_worksheet(&test, &RenderOptions { answer_key }, &output)?;
    println!("Wrote {}", output.display());
    Ok(())
}
