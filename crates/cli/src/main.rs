use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use symbolart_client::api::ConversionApi;
use symbolart_core::settings::{GenerationSettings, Palette, Quality, SettingsStore};
use symbolart_core::source::SourceImage;
use symbolart_workflow::export::LocalDirSink;
use symbolart_workflow::{SubmitOutcome, TransformationWorkflow, WorkflowState};

mod config;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "symbolart", version, about = "Turn a picture into symbol art")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one image and save the result as `symbol_art.png`.
    Convert(ConvertArgs),
    /// Check that the conversion service is up.
    Health,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Image to convert.
    image: PathBuf,

    /// Upscaling tier: low, medium or high.
    #[arg(long, short, default_value_t = Quality::Low)]
    quality: Quality,

    /// Symbol palette: math, ascii or greek.
    #[arg(long, short, default_value_t = Palette::Math)]
    palette: Palette,

    /// Directory to save the result into (overrides `SYMBOLART_EXPORT_DIR`).
    #[arg(long, short)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "symbolart=info,symbolart_workflow=info,symbolart_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("load configuration")?;
    tracing::debug!(
        process_url = %config.service.process_url(),
        export_dir = %config.export_dir.display(),
        "Loaded configuration",
    );

    match cli.cmd {
        Command::Convert(args) => cmd_convert(config, args).await,
        Command::Health => cmd_health(config).await,
    }
}

async fn cmd_convert(config: AppConfig, args: ConvertArgs) -> anyhow::Result<()> {
    let api = ConversionApi::new(config.service).context("build HTTP client")?;
    let sink = LocalDirSink::new(args.out_dir.unwrap_or(config.export_dir));
    let settings = SettingsStore::with_settings(GenerationSettings {
        quality: args.quality,
        palette: args.palette,
    });
    let workflow = TransformationWorkflow::new(api, sink, settings);

    let source = SourceImage::from_path(&args.image)
        .await
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    workflow.select_image(source).await;

    let outcome = workflow.submit().await?;
    let result = match outcome {
        SubmitOutcome::Applied(WorkflowState::Succeeded(handle)) => {
            let info = handle.info();
            tracing::info!(width = info.width, height = info.height, "Symbol art ready");
            let path = workflow.export_result().await?;
            println!("{}", path.display());
            Ok(())
        }
        SubmitOutcome::Applied(WorkflowState::Failed(message)) => {
            Err(anyhow::anyhow!("Processing failed: {message}"))
        }
        other => Err(anyhow::anyhow!("Unexpected conversion outcome: {other:?}")),
    };

    workflow.end_session().await;
    result
}

async fn cmd_health(config: AppConfig) -> anyhow::Result<()> {
    let url = config.service.health_url();
    let api = ConversionApi::new(config.service).context("build HTTP client")?;
    let health = api
        .health()
        .await
        .with_context(|| format!("probe '{url}'"))?;
    println!("{}", health.status);
    Ok(())
}
