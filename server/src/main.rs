use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tfidx::tokenizer::{Cleaner, CleanerOptions};
use tracing_subscriber::{fmt, EnvFilter};
use server::build_app;
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Snowball stemmer language; must match the one used at build time
    #[arg(long, default_value = "portuguese")]
    language: String,
    /// Comma/newline separated stop-word file
    #[arg(long)]
    stop_words: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    keep_stop_words: bool,
    #[arg(long, default_value_t = false)]
    keep_accents: bool,
    #[arg(long, default_value_t = false)]
    no_stemming: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let options = CleanerOptions {
        remove_stop_words: !args.keep_stop_words,
        remove_accents: !args.keep_accents,
        stem: !args.no_stemming,
    };
    let cleaner = Cleaner::from_options(&args.language, args.stop_words.as_deref(), options)?;
    let app: Router = build_app(&args.index, cleaner)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
