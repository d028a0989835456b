use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use novel_files::{
    config::ClientConfig, format_file_size, query, Accept, FileManager, ListQuery, LocalFile,
    TracingNotifier, UploadFields,
};

#[derive(Parser)]
#[command(name = "novel-files")]
#[command(about = "List and upload novel asset files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a page of files and print a filtered view of it
    List {
        /// Server-side category filter
        #[arg(long)]
        category: Option<String>,
        /// Server-side search
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        novel_id: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        /// Local type filter, e.g. `image/*` or `.pdf` (repeatable)
        #[arg(long)]
        accept: Vec<String>,
        /// Local category filter over the loaded page
        #[arg(long, default_value = "")]
        filter_category: String,
        /// Local keyword search over the loaded page
        #[arg(long, default_value = "")]
        keyword: String,
    },
    /// Validate and upload a file
    Upload {
        #[arg(help = "Path to file to upload")]
        file: PathBuf,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        novel_id: Option<String>,
        /// Allowed types, e.g. `image/*` or `.pdf` (repeatable)
        #[arg(long)]
        accept: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = Cli::parse();

    let config = ClientConfig::load()?;
    info!(api = %config.api.base_url, "Loaded configuration");

    let manager = FileManager::connect(&config, Arc::new(TracingNotifier))?;

    match cli.command {
        Commands::List {
            category,
            search,
            novel_id,
            page,
            limit,
            accept,
            filter_category,
            keyword,
        } => {
            let listing = &manager.listing;
            listing
                .load_files(ListQuery {
                    category,
                    search,
                    novel_id,
                    page,
                    limit,
                })
                .await;

            let state = listing.state();
            if let Some(error) = state.error {
                anyhow::bail!("failed to load files: {error}");
            }

            let accept = Accept::parse(&accept);
            let view = query::search_files(
                query::filter_by_type(
                    query::filter_by_category(&state.files, &filter_category),
                    &accept,
                ),
                &keyword,
            );

            for file in &view {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    file.id,
                    file.file_name,
                    file.file_type,
                    format_file_size(file.file_size),
                    file.category.as_deref().unwrap_or("-"),
                );
            }
            println!("{} shown, {} loaded, {} total", view.len(), state.files.len(), state.total);
        }
        Commands::Upload {
            file,
            category,
            description,
            novel_id,
            accept,
        } => {
            let local = LocalFile::open(&file).await?;
            let options = manager
                .upload_options
                .clone()
                .with_accept(Accept::parse(&accept));

            if !manager.uploader.validate_file(&local, &options) {
                anyhow::bail!("file rejected: {}", local.name);
            }

            let fields = UploadFields {
                category,
                description,
                novel_id,
            };
            let record = manager.uploader.upload_file(&local, &fields).await?;
            println!(
                "{}\t{}\t{}",
                record.id,
                record.file_name,
                format_file_size(record.file_size)
            );
        }
    }

    Ok(())
}
