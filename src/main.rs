mod client;
mod config;
mod errors;
mod handlers;
mod keys;
mod models;
mod storage;

use clap::{ArgGroup, Args, Parser, Subcommand};
use client::{ExportFormat, FormState, GenerateCodeForm, HttpUploader, QrCodeGenerator};
use config::{Config, TransferMode};
use handlers::AppState;
use reqwest::Url;
use std::net::SocketAddr;
use std::path::PathBuf;
use storage::create_storage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn a URL or an uploaded file into a QR code")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Generate a QR code for a URL, or upload a file and encode its link
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("content").required(true).args(["url", "file"])))]
struct GenerateArgs {
    /// URL to encode
    #[arg(long)]
    url: Option<String>,

    /// File to upload and link to
    #[arg(long)]
    file: Option<PathBuf>,

    /// Base URL of a running server
    #[arg(long, env = "APP_URL", default_value = "http://localhost:3000")]
    server: Url,

    /// Must match the server's transfer mode
    #[arg(long, env = "TRANSFER_MODE", default_value = "presigned")]
    transfer_mode: TransferMode,

    /// png, jpg or svg
    #[arg(long, default_value = "png")]
    format: ExportFormat,

    /// Directory the image is written to
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Print a data: URL instead of writing a file
    #[arg(long)]
    data_url: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrdrop=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Generate(args) => generate(args).await,
    }
}

async fn serve() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting qrdrop");
    tracing::info!("Transfer mode: {}", config.transfer_mode);

    let state = AppState {
        storage: create_storage(&config).await,
        config: config.clone(),
    };

    let app = handlers::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let form = match args.url {
        Some(url) => GenerateCodeForm::Url { url },
        None => GenerateCodeForm::File { file: args.file },
    };
    let input = form.validate().await?;

    let mut generator = QrCodeGenerator::new(HttpUploader::new(args.server, args.transfer_mode));
    let submitted = generator.submit(input).await.map(|_| ());
    if let Err(e) = submitted {
        if let FormState::Idle {
            error: Some(notice),
        } = generator.state()
        {
            eprintln!("{}", notice);
        }
        return Err(e.into());
    }

    let code = generator
        .code()
        .ok_or_else(|| anyhow::anyhow!("No QR code was rendered"))?;

    if args.data_url {
        println!("{}", code.to_data_url(args.format)?);
        return Ok(());
    }

    let image = code.export(args.format)?;
    let path = image.save(&args.output).await?;
    println!("{} -> {}", code.value(), path.display());

    Ok(())
}
