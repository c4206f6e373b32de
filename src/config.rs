use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub document: DocumentConfig,
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub index: IndexConfig,
    pub domain: DomainConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity for a retrieved chunk to count as
    /// relevant. Matches below the floor are discarded before the
    /// no-relevant-information check.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

fn default_min_score() -> f32 {
    0.25
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dims: usize,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generation_provider() -> String {
    "ollama".to_string()
}
fn default_temperature() -> f64 {
    0.4
}
fn default_generation_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_backend")]
    pub backend: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_index_backend() -> String {
    "sqlite".to_string()
}

/// Which assistant this deployment serves, plus optional copy overrides.
///
/// The career and HR assistants are the same binary with different
/// `[domain]` sections; all behavioral asymmetry lives in the resolved
/// [`DomainProfile`](crate::query::DomainProfile).
#[derive(Debug, Deserialize, Clone)]
pub struct DomainConfig {
    /// Domain profile name: `career` or `hr`.
    pub profile: String,
    /// Override for the empty-question validation message.
    #[serde(default)]
    pub validation_message: Option<String>,
    /// Override for the no-relevant-information message.
    #[serde(default)]
    pub no_match_message: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if !(-1.0..=1.0).contains(&config.retrieval.min_score) {
        anyhow::bail!("retrieval.min_score must be in [-1.0, 1.0]");
    }

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }

    match config.embedding.provider.as_str() {
        "ollama" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be ollama or openai.",
            other
        ),
    }

    match config.generation.provider.as_str() {
        "ollama" => {}
        other => anyhow::bail!("Unknown generation provider: '{}'. Must be ollama.", other),
    }

    match config.index.backend.as_str() {
        "memory" => {}
        "sqlite" => {
            if config.index.path.is_none() {
                anyhow::bail!("index.path must be set when index.backend is 'sqlite'");
            }
        }
        other => anyhow::bail!(
            "Unknown index backend: '{}'. Must be sqlite or memory.",
            other
        ),
    }

    match config.domain.profile.as_str() {
        "career" | "hr" => {}
        other => anyhow::bail!("Unknown domain profile: '{}'. Must be career or hr.", other),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    const VALID: &str = r#"
[document]
path = "resources/handbook.pdf"

[chunking]
max_tokens = 700

[embedding]
provider = "ollama"
model = "nomic-embed-text"
dims = 768

[generation]
model = "llama3"

[index]
backend = "memory"

[domain]
profile = "career"

[server]
bind = "127.0.0.1:8000"
"#;

    #[test]
    fn valid_config_parses_with_defaults() {
        let f = write_config(VALID);
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.retrieval.top_k, 4);
        assert!((cfg.retrieval.min_score - 0.25).abs() < f32::EPSILON);
        assert_eq!(cfg.embedding.batch_size, 64);
        assert_eq!(cfg.generation.provider, "ollama");
        assert!((cfg.generation.temperature - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_domain_profile_rejected() {
        let f = write_config(&VALID.replace("profile = \"career\"", "profile = \"legal\""));
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn sqlite_backend_requires_path() {
        let f = write_config(&VALID.replace("backend = \"memory\"", "backend = \"sqlite\""));
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn zero_max_tokens_rejected() {
        let f = write_config(&VALID.replace("max_tokens = 700", "max_tokens = 0"));
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn out_of_range_min_score_rejected() {
        let body = format!("{}\n[retrieval]\nmin_score = 1.5\n", VALID);
        let f = write_config(&body);
        assert!(load_config(f.path()).is_err());
    }
}
