//! `examforge.toml` loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examforge_core::knowledge::KnowledgeBase;
use examforge_providers::{create_provider, ContentFlows, ModelsConfig, ProviderConfig};
use examforge_storage::{StorageConfig, TestStorage};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamforgeConfig {
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Curriculum TOML file or directory; the built-in curriculum when unset.
    #[serde(default)]
    pub knowledge_base: Option<PathBuf>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_provider() -> String {
    "openai".into()
}

impl Default for ExamforgeConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            knowledge_base: None,
            providers: HashMap::new(),
            models: ModelsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ExamforgeConfig {
    /// Open the configured persistence service.
    pub fn storage(&self) -> Result<TestStorage> {
        self.storage.open().with_context(|| {
            format!(
                "failed to open storage at {}",
                self.storage.documents_dir.display()
            )
        })
    }

    /// Load the configured knowledge base.
    pub fn knowledge_base(&self) -> Result<KnowledgeBase> {
        match &self.knowledge_base {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading knowledge base");
                examforge_core::parser::load_knowledge_base(path)
            }
            None => KnowledgeBase::builtin(),
        }
    }

    /// Content flows backed by the named provider, or the default one.
    pub fn flows(&self, provider: Option<&str>) -> Result<ContentFlows> {
        let name = provider.unwrap_or(&self.default_provider);
        let provider_config = self.providers.get(name).with_context(|| {
            format!("provider '{name}' is not configured. Run `examforge init` or add [providers.{name}] to the config")
        })?;
        let provider = create_provider(provider_config)?;
        ContentFlows::new(provider, self.models.clone())
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `examforge.toml` in the current directory
/// 2. `~/.config/examforge/config.toml`
///
/// `EXAMFORGE_OPENAI_KEY` overrides the `openai` provider's key.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content).with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamforgeConfig::default(),
    };

    if let Ok(key) = std::env::var("EXAMFORGE_OPENAI_KEY") {
        apply_openai_key(&mut config, key);
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), v.resolved()))
        .collect();

    Ok(config)
}

fn parse_config(content: &str) -> Result<ExamforgeConfig> {
    Ok(toml::from_str(content)?)
}

fn apply_openai_key(config: &mut ExamforgeConfig, key: String) {
    let entry = config
        .providers
        .entry("openai".into())
        .or_insert(ProviderConfig::OpenAI {
            api_key: String::new(),
            base_url: None,
            org_id: None,
        });
    if let ProviderConfig::OpenAI { api_key, .. } = entry {
        *api_key = key;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examforge"))
}
