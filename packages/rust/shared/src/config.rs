//! Application configuration for postsmith.
//!
//! User config lives at `~/.postsmith/postsmith.toml`.
//! API secrets are referenced by environment-variable *name* in the config
//! file and resolved once at process start; the file never stores a key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PostsmithError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "postsmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".postsmith";

// ---------------------------------------------------------------------------
// Config structs (matching postsmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target CMS settings.
    #[serde(default)]
    pub cms: CmsConfig,

    /// Web-search API settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Generative-language API settings.
    #[serde(default)]
    pub genai: GenAiConfig,

    /// Article content policy (keywords, tags, branding).
    #[serde(default)]
    pub content: ContentConfig,

    /// Persisted-state settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[cms]` section — the WordPress-compatible REST target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Site URL, e.g. `https://example.com`. The client targets the
    /// standard `wp/v2/posts` REST route under it.
    #[serde(default)]
    pub base_url: String,

    /// Basic-auth username.
    #[serde(default)]
    pub username: String,

    /// Name of the env var holding the application password.
    #[serde(default = "default_cms_password_env")]
    pub password_env: String,

    /// Category id to assign to created posts; 0 means no category.
    #[serde(default)]
    pub category_id: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password_env: default_cms_password_env(),
            category_id: 0,
        }
    }
}

fn default_cms_password_env() -> String {
    "POSTSMITH_CMS_APP_PASSWORD".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Custom search engine / collection id (`cx` parameter).
    #[serde(default)]
    pub engine_id: String,

    /// Name of the env var holding the search API key.
    #[serde(default = "default_search_api_key_env")]
    pub api_key_env: String,

    /// Result locale (`hl` parameter).
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Number of results to request per query.
    #[serde(default = "default_result_count")]
    pub result_count: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            engine_id: String::new(),
            api_key_env: default_search_api_key_env(),
            locale: default_locale(),
            result_count: default_result_count(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".into()
}
fn default_search_api_key_env() -> String {
    "POSTSMITH_SEARCH_API_KEY".into()
}
fn default_locale() -> String {
    "en".into()
}
fn default_result_count() -> u32 {
    5
}

/// `[genai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    /// Base URL of the generative-language API.
    #[serde(default = "default_genai_endpoint_base")]
    pub endpoint_base: String,

    /// Model identifier appended to the base URL.
    #[serde(default = "default_genai_model")]
    pub model: String,

    /// Name of the env var holding the generation API key.
    #[serde(default = "default_genai_api_key_env")]
    pub api_key_env: String,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            endpoint_base: default_genai_endpoint_base(),
            model: default_genai_model(),
            api_key_env: default_genai_api_key_env(),
        }
    }
}

fn default_genai_endpoint_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".into()
}
fn default_genai_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_genai_api_key_env() -> String {
    "POSTSMITH_GENAI_API_KEY".into()
}

impl GenAiConfig {
    /// Full `generateContent` endpoint for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint_base.trim_end_matches('/'),
            self.model
        )
    }
}

/// `[content]` section — what to write about and how to brand it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Brand name woven into each article and the attribution block.
    #[serde(default = "default_brand")]
    pub brand: String,

    /// Site name for the attribution block.
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Topic keywords; each run draws a random subset.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Tags appended to every article.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Maximum number of posts published per run.
    #[serde(default = "default_posts_per_run")]
    pub posts_per_run: usize,

    /// Suffix appended to SEO titles and fallback descriptions.
    #[serde(default)]
    pub seo_brand_suffix: String,

    /// Fallback focus keywords when the model omits them.
    #[serde(default)]
    pub default_seo_keywords: Vec<String>,

    /// Reference URLs used when the search API yields nothing new.
    #[serde(default = "default_fallback_references")]
    pub fallback_references: Vec<String>,

    /// Delay between keywords, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            site_name: default_site_name(),
            keywords: Vec::new(),
            tags: Vec::new(),
            posts_per_run: default_posts_per_run(),
            seo_brand_suffix: String::new(),
            default_seo_keywords: Vec::new(),
            fallback_references: default_fallback_references(),
            delay_secs: default_delay_secs(),
        }
    }
}

fn default_brand() -> String {
    "My Brand".into()
}
fn default_site_name() -> String {
    "example.com".into()
}
fn default_posts_per_run() -> usize {
    1
}
fn default_fallback_references() -> Vec<String> {
    vec![
        "https://www.healthline.com".into(),
        "https://pubmed.ncbi.nlm.nih.gov".into(),
        "https://www.webmd.com".into(),
    ]
}
fn default_delay_secs() -> u64 {
    5
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the used-reference JSON file.
    #[serde(default = "default_used_refs_path")]
    pub used_refs_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            used_refs_path: default_used_refs_path(),
        }
    }
}

fn default_used_refs_path() -> String {
    "used_refs.json".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.postsmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PostsmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.postsmith/postsmith.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PostsmithError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PostsmithError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PostsmithError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PostsmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PostsmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the env var named in the config.
fn resolve_secret(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(PostsmithError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that all required API-key env vars are set and non-empty.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    resolve_secret(&config.search.api_key_env, "search API key")?;
    resolve_secret(&config.genai.api_key_env, "generation API key")?;
    resolve_secret(&config.cms.password_env, "CMS application password")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Run config (runtime, secrets resolved)
// ---------------------------------------------------------------------------

/// Runtime run configuration — `AppConfig` with secrets resolved, built once
/// at process start and passed by reference into each component.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// CMS site URL.
    pub cms_url: String,
    /// CMS basic-auth username.
    pub cms_username: String,
    /// CMS basic-auth application password.
    pub cms_password: String,
    /// Category id for created posts; 0 means none.
    pub category_id: u64,

    /// Search API endpoint.
    pub search_endpoint: String,
    /// Search engine id.
    pub search_engine_id: String,
    /// Search API key.
    pub search_api_key: String,
    /// Search locale.
    pub search_locale: String,
    /// Results requested per search.
    pub search_result_count: u32,

    /// Full generateContent endpoint.
    pub genai_url: String,
    /// Generation API key.
    pub genai_api_key: String,

    /// Content policy.
    pub content: ContentConfig,
    /// Path of the used-reference store.
    pub used_refs_path: PathBuf,
}

impl RunConfig {
    /// Build a runtime config from the loaded file, resolving secrets.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        if config.cms.base_url.is_empty() {
            return Err(PostsmithError::config(
                "cms.base_url is not set; point it at your CMS site",
            ));
        }

        Ok(Self {
            cms_url: config.cms.base_url.clone(),
            cms_username: config.cms.username.clone(),
            cms_password: resolve_secret(&config.cms.password_env, "CMS application password")?,
            category_id: config.cms.category_id,
            search_endpoint: config.search.endpoint.clone(),
            search_engine_id: config.search.engine_id.clone(),
            search_api_key: resolve_secret(&config.search.api_key_env, "search API key")?,
            search_locale: config.search.locale.clone(),
            search_result_count: config.search.result_count,
            genai_url: config.genai.generate_url(),
            genai_api_key: resolve_secret(&config.genai.api_key_env, "generation API key")?,
            content: config.content.clone(),
            used_refs_path: PathBuf::from(&config.storage.used_refs_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("POSTSMITH_SEARCH_API_KEY"));
        assert!(toml_str.contains("used_refs.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.content.posts_per_run, 1);
        assert_eq!(parsed.search.result_count, 5);
        assert_eq!(parsed.genai.model, "gemini-2.5-flash");
    }

    #[test]
    fn config_with_keywords() {
        let toml_str = r#"
[cms]
base_url = "https://blog.example.com/wp-json/wp/v2/posts"
username = "editor"

[content]
brand = "Vitality Lab"
keywords = ["magnesium benefits", "vitamin d dosage"]
tags = ["health", "supplements"]
posts_per_run = 2
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.content.keywords.len(), 2);
        assert_eq!(config.content.brand, "Vitality Lab");
        assert_eq!(config.cms.username, "editor");
        // Unspecified sections keep their defaults.
        assert_eq!(config.storage.used_refs_path, "used_refs.json");
        assert_eq!(config.content.fallback_references.len(), 3);
    }

    #[test]
    fn generate_url_joins_model() {
        let genai = GenAiConfig {
            endpoint_base: "https://generativelanguage.googleapis.com/v1beta/models/".into(),
            model: "gemini-2.5-flash".into(),
            api_key_env: "X".into(),
        };
        assert_eq!(
            genai.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn api_key_validation_fails_when_unset() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.search.api_key_env = "POSTSMITH_TEST_NONEXISTENT_KEY_98431".into();
        let result = validate_api_keys(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("search API key"));
    }

    #[test]
    fn run_config_requires_cms_url() {
        let config = AppConfig::default();
        let err = RunConfig::from_app_config(&config).unwrap_err();
        assert!(err.to_string().contains("cms.base_url"));
    }
}
