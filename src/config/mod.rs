// Configuration management module
// TOML settings under ~/.ragchat plus the interactive setup wizard

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CompletionConfig, Config, ConfigError, EmbeddingConfig, EmbeddingProvider, GOOGLE_API_KEY_VAR,
    GROQ_API_KEY_VAR, GoogleConfig, OllamaConfig, RetrievalConfig, resolve_api_key,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
