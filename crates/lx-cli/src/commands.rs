//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lx_assets::{
    AssetReference, AssetService, CandidateFile, DataUriPreviewGenerator, FileHeader,
    FileValidator, LocalBlobStore, ProgressSink, ReadFileError, UploadProgress,
};
use lx_contracts::NewsArticleContract;
use lx_core::config::AppConfig;
use lx_core::types::AssetCategory;
use lx_models::{NewsArticle, NewsArticleDraft, NewsArticleField};
use lx_services::{AssetForm, MemoryPersistence, PersistedEntity, SaveCoordinator};
use serde::Serialize;
use tracing::{info, warn};

/// Lexportal asset pipeline, driven from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "lexportal",
    version,
    about = "Validate, upload and publish Lexportal image assets against a local blob store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Check a file against the upload limits.
    Validate {
        file: PathBuf,
    },

    /// Upload a file and print its locator.
    Upload {
        /// clients, lawyers or news.
        #[arg(value_parser = parse_category)]
        category: AssetCategory,

        file: PathBuf,
    },

    /// Delete the stored object a locator points at.
    Delete {
        locator: String,
    },

    /// Create a news article with a cover image and print the saved record.
    PublishNews {
        #[arg(long)]
        title: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        summary: Option<String>,

        /// Cover image.
        #[arg(long)]
        image: PathBuf,
    },
}

fn parse_category(value: &str) -> std::result::Result<AssetCategory, String> {
    AssetCategory::parse(value)
        .ok_or_else(|| format!("unknown category {:?} (expected clients, lawyers or news)", value))
}

pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "info,lx_assets=debug,lx_services=debug",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries command output
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_config();

    match cli.command {
        Command::Validate { file } => {
            let report = validate_file(&config, &file).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(reason) = report.reason {
                bail!("{}: {}", report.name, reason);
            }
        }
        Command::Upload { category, file } => {
            let reference = upload_file(&config, category, &file).await?;
            println!("{}", reference);
        }
        Command::Delete { locator } => {
            let path = delete_asset(&config, &locator).await?;
            println!("{}", path);
        }
        Command::PublishNews {
            title,
            category,
            summary,
            image,
        } => {
            let saved = publish_news(&config, title, category, summary, &image).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
    }
    Ok(())
}

fn load_config() -> AppConfig {
    AppConfig::from_env().unwrap_or_else(|e| {
        warn!("Failed to load config from env: {}, using defaults", e);
        AppConfig::default()
    })
}

fn asset_service(config: &AppConfig) -> AssetService<LocalBlobStore> {
    let store = LocalBlobStore::new(
        &config.storage.local_path,
        config.storage.public_base_url.as_str(),
        config.storage.transfer_chunk_bytes,
    );
    AssetService::new(Arc::new(store), &config.assets)
}

async fn read_candidate(validator: &FileValidator, path: &Path) -> Result<CandidateFile> {
    validator
        .read_file(path)
        .await
        .with_context(|| format!("cannot load {}", path.display()))
}

/// Logs each percent step once
#[derive(Debug, Default)]
struct LoggedProgress {
    last_percent: Option<u8>,
}

impl ProgressSink for LoggedProgress {
    fn publish(&mut self, progress: &UploadProgress) {
        if progress.is_active && self.last_percent != Some(progress.percent_complete) {
            info!(percent = progress.percent_complete, "Uploading");
            self.last_percent = Some(progress.percent_complete);
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileReport {
    name: String,
    media_type: String,
    size: u64,
    human_size: String,
    accepted: bool,
    reason: Option<String>,
}

async fn validate_file(config: &AppConfig, path: &Path) -> Result<FileReport> {
    let header = FileHeader::inspect(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let validator = FileValidator::new(&config.assets);

    let result = match validator.read_header(header.clone()).await {
        Ok(file) => validator.validate_upload(&file),
        Err(ReadFileError::Rejected(reason)) => Err(reason),
        Err(e) => return Err(e).with_context(|| format!("cannot read {}", path.display())),
    };

    Ok(FileReport {
        name: header.name().to_string(),
        media_type: header.media_type().to_string(),
        size: header.size(),
        human_size: header.human_size(),
        accepted: result.is_ok(),
        reason: result.err().map(|reason| reason.to_string()),
    })
}

async fn upload_file(
    config: &AppConfig,
    category: AssetCategory,
    path: &Path,
) -> Result<AssetReference> {
    let service = asset_service(config);
    let file = read_candidate(service.validator(), path).await?;
    let mut session = service.new_session(category);
    let mut progress = LoggedProgress::default();

    let reference = session.run(&file, &mut progress).await?;
    Ok(reference)
}

async fn delete_asset(config: &AppConfig, locator: &str) -> Result<String> {
    let path = asset_service(config).delete_by_locator(locator).await?;
    Ok(path)
}

async fn publish_news(
    config: &AppConfig,
    title: String,
    category: String,
    summary: Option<String>,
    image: &Path,
) -> Result<PersistedEntity<NewsArticle>> {
    let service = asset_service(config);
    let persistence = Arc::new(MemoryPersistence::<NewsArticle>::new());
    let coordinator = SaveCoordinator::new(service.clone(), persistence, NewsArticleContract);

    let mut form = AssetForm::<NewsArticleDraft>::create(service.validator().clone());
    form.update(NewsArticleField::Title(title));
    form.update(NewsArticleField::Category(category));
    if let Some(summary) = summary {
        form.update(NewsArticleField::Summary(summary));
    }

    let file = read_candidate(service.validator(), image).await?;
    form.select_file(file, &DataUriPreviewGenerator::new(&config.assets))
        .await?;

    match coordinator.submit(&mut form).await {
        Ok(saved) => Ok(saved),
        Err(e) => {
            warn!(kind = %e.kind(), "News article not published");
            bail!("{}", e.user_message())
        }
    }
}
