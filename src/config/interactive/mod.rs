
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, EmbeddingProvider, OllamaConfig};
use crate::embeddings::{ChunkingConfig, OllamaEmbedder};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 ragchat Configuration Setup").bold().cyan());
    eprintln!();

    let config_dir = Config::config_dir().context("Failed to determine config directory")?;
    let mut config = load_existing_config(&config_dir)?;

    eprintln!("{}", style("Embedding Configuration").bold().yellow());
    eprintln!("Choose the service used to embed document chunks and questions.");
    eprintln!();
    configure_embedding(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Chat Completion Configuration").bold().yellow());
    configure_completion(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Document Retrieval").bold().yellow());
    configure_retrieval(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());
    report_readiness(&config);

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    let embedding = &config.embedding;
    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Provider: {}", style(embedding.provider).cyan());
    match embedding.provider {
        EmbeddingProvider::Google => {
            eprintln!("  Endpoint: {}", style(&embedding.google.base_url).cyan());
            eprintln!("  Model: {}", style(&embedding.google.model).cyan());
            eprintln!(
                "  API Key: {}",
                key_status(embedding.google.api_key().is_ok())
            );
        }
        EmbeddingProvider::Ollama => {
            match embedding.ollama.ollama_url() {
                Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
                Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
            }
            eprintln!("  Model: {}", style(&embedding.ollama.model).cyan());
        }
    }
    eprintln!("  Batch Size: {}", style(embedding.batch_size).cyan());
    eprintln!(
        "  Timeout: {}s",
        style(embedding.request_timeout_secs).cyan()
    );

    let completion = &config.completion;
    eprintln!();
    eprintln!("{}", style("Chat Completion Settings:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&completion.base_url).cyan());
    eprintln!("  Document Q&A Model: {}", style(&completion.document_model).cyan());
    eprintln!("  Q&A Model: {}", style(&completion.qa_model).cyan());
    eprintln!("  Travel Model: {}", style(&completion.travel_model).cyan());
    eprintln!("  Temperature: {}", style(completion.temperature).cyan());
    eprintln!("  API Key: {}", key_status(completion.api_key().is_ok()));

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!(
        "  Documents: {}",
        style(config.retrieval.documents_dir.display()).cyan()
    );
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    match config.retrieval.max_pages {
        Some(max) => eprintln!("  Max Pages: {}", style(max).cyan()),
        None => eprintln!("  Max Pages: {}", style("unlimited").cyan()),
    }
    eprintln!(
        "  Chunking: {} chars, {} overlap",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.chunk_overlap).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn key_status(present: bool) -> console::StyledObject<&'static str> {
    if present {
        style("configured").green()
    } else {
        style("missing").red()
    }
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    Config::load_from(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No valid configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_embedding(config: &mut Config) -> Result<()> {
    let providers = [EmbeddingProvider::Google, EmbeddingProvider::Ollama];
    let labels = &["google (Generative Language API)", "ollama (local server)"];
    let default_index = providers
        .iter()
        .position(|&p| p == config.embedding.provider)
        .unwrap_or(0);

    let provider_index = Select::new()
        .with_prompt("Embedding provider")
        .default(default_index)
        .items(labels)
        .interact()?;
    config.embedding.provider = providers[provider_index];

    match config.embedding.provider {
        EmbeddingProvider::Google => {
            let model: String = Input::new()
                .with_prompt("Embedding model")
                .default(config.embedding.google.model.clone())
                .validate_with(|input: &String| non_empty(input))
                .interact_text()?;
            config.embedding.google.model = model;
        }
        EmbeddingProvider::Ollama => configure_ollama(&mut config.embedding.ollama)?,
    }

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(config.embedding.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    config.embedding.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| non_empty(input))
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;

    Ok(())
}

fn configure_completion(config: &mut Config) -> Result<()> {
    let model: String = Input::new()
        .with_prompt("Document Q&A model")
        .default(config.completion.document_model.clone())
        .validate_with(|input: &String| non_empty(input))
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Temperature")
        .default(config.completion.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    config.completion.set_document_model(model)?;
    config.completion.set_temperature(temperature)?;
    Ok(())
}

fn configure_retrieval(config: &mut Config) -> Result<()> {
    let documents_dir: String = Input::new()
        .with_prompt("PDF directory")
        .default(config.retrieval.documents_dir.display().to_string())
        .validate_with(|input: &String| non_empty(input))
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Chunks retrieved per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Must be between 1 and 100")
            }
        })
        .interact_text()?;

    let chunk_size: usize = Input::new()
        .with_prompt("Chunk size (characters)")
        .default(config.chunking.chunk_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100_000).contains(input) {
                Ok(())
            } else {
                Err("Must be between 1 and 100000")
            }
        })
        .interact_text()?;

    let chunk_overlap: usize = Input::new()
        .with_prompt("Chunk overlap (characters)")
        .default(config.chunking.chunk_overlap.min(chunk_size - 1))
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input < chunk_size {
                Ok(())
            } else {
                Err("Overlap must be smaller than the chunk size")
            }
        })
        .interact_text()?;

    config.retrieval.documents_dir = PathBuf::from(documents_dir);
    config.retrieval.set_top_k(top_k)?;
    config.chunking = ChunkingConfig {
        chunk_size,
        chunk_overlap,
    };
    config.validate()?;
    Ok(())
}

fn non_empty(input: &str) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Value cannot be empty")
    } else {
        Ok(())
    }
}

fn report_readiness(config: &Config) {
    match config.embedding.provider {
        EmbeddingProvider::Google => {
            report_key("Google embedding", config.embedding.google.api_key());
        }
        EmbeddingProvider::Ollama => {
            match OllamaEmbedder::new(config).map(|client| client.health_check()) {
                Ok(Ok(())) => {
                    eprintln!("{}", style("✓ Ollama connection successful!").green());
                }
                Ok(Err(e)) | Err(e) => {
                    eprintln!(
                        "{}",
                        style(format!("⚠ Warning: Could not reach Ollama: {}", e)).yellow()
                    );
                    eprintln!("You can continue, but make sure Ollama is running before indexing.");
                }
            }
        }
    }
    report_key("Groq", config.completion.api_key());
}

fn report_key(service: &str, key: Result<String, ConfigError>) {
    match key {
        Ok(_) => eprintln!("{}", style(format!("✓ {} API key found", service)).green()),
        Err(e) => eprintln!("{}", style(format!("⚠ Warning: {}", e)).yellow()),
    }
}
