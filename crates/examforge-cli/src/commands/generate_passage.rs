//! The `examforge generate-passage` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examforge_core::flows::{PassageLength, PassageRequest};

use crate::config::load_config_from;

pub async fn execute(
    topic: String,
    length: String,
    curriculum: Option<String>,
    unit: Option<String>,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let length: PassageLength = length.parse().map_err(anyhow::Error::msg)?;
    let config = load_config_from(config_path.as_deref())?;

    let knowledge = match (curriculum, unit) {
        (Some(curriculum), Some(unit)) => Some(
            config
                .knowledge_base()?
                .passage_knowledge(&curriculum, &unit)
                .with_context(|| format!("unknown unit {curriculum}/{unit}"))?,
        ),
        _ => None,
    };

    let flows = config.flows(provider.as_deref())?;
    let response = flows
        .generate_passage(&PassageRequest {
            topic,
            length,
            knowledge,
        })
        .await?;

    println!("{}", response.passage);
    Ok(())
}
