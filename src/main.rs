use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::document::ZLayer;
use crate::page::Page;
use crate::transport::{HttpTransport, Transport};

mod app;
mod cli;
mod config;
mod core;
mod document;
mod interpret;
mod modal;
mod page;
mod registry;
mod stream;
mod sync;
mod theme;
mod transport;
mod ui;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting modalframe");

    let args = cli::Args::parse();
    let config = config::load(args.config.as_deref())?;

    let url = args
        .url
        .or_else(|| config.page.base_url.clone())
        .ok_or_else(|| eyre!("no page URL given and page.base_url is not configured"))?;
    let layer = match args.layer.as_deref() {
        Some(layer) => ZLayer::parse(layer).ok_or_else(|| eyre!("invalid layer {layer:?}"))?,
        None => config.page.layer(),
    };

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&url, config.timing.request_timeout())?);
    let page = Page::load(transport, &url, config.timing.clone(), layer).await?;

    let mut app = App::new(page, &config);
    app.run().await?;

    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("modalframe").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "modalframe.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
