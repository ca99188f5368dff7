//! The `examforge shuffle` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::flows::ShuffleRequest;
use examforge_core::words::shuffle_words;

use crate::config::load_config_from;

pub async fn execute(
    sentence: String,
    local: bool,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let shuffled = if local {
        shuffle_words(&sentence)
    } else {
        let config = load_config_from(config_path.as_deref())?;
        let flows = config.flows(provider.as_deref())?;
        flows
            .shuffle_words(&ShuffleRequest { sentence })
            .await?
            .shuffled_sentence
    };
    println!("{shuffled}");
    Ok(())
}
