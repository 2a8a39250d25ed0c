use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gateway::{GenerationGateway, HttpGenerationGateway, UnavailableGateway};
use shared::{
    catalog::{builtin_styles, find_style},
    domain::HistoryItemId,
};
use storage::{HistoryStore, SqliteKeyValueStore};
use tracing_subscriber::EnvFilter;
use workflow::{Confirmation, SystemClock, WorkflowController};

mod capture;
mod config;
mod render;

use config::{load_settings, Settings};
use render::Rendered;

const CLEAR_HISTORY_QUESTION: &str =
    "Are you sure you want to clear your entire creation history?";

#[derive(Parser, Debug)]
#[command(name = "alterevo", version, about = "Restyle a photo and caption it")]
struct Args {
    /// Config file (defaults to ./alterevo.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available styles.
    Styles,
    /// Transform an image and caption it.
    Transform {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        style: String,
        /// Where to write the generated image.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    List,
    /// Show a past creation without generating anything.
    Show {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(database_url) = &args.database_url {
        settings.database_url = storage::normalize_database_url(database_url);
    }

    match args.command {
        Command::Styles => {
            render::print_styles(&builtin_styles());
            Ok(ExitCode::SUCCESS)
        }
        Command::Transform { image, style, out } => {
            let style = find_style(&style).with_context(|| {
                format!("unknown style '{style}'; run `alterevo styles` to list them")
            })?;
            let gateway = http_gateway(&settings)?;
            let user_image = capture::capture_user_image(&image).await?;
            let mut controller = controller(&settings, gateway).await?;

            // dispatch returns only after both calls settle
            println!("{}", render::loading_line(&style));
            controller.submit(user_image, style).await;

            let out = out.unwrap_or_else(|| default_output_path(&controller));
            Ok(exit_code(render::render_screen(controller.screen(), &out)?))
        }
        Command::History { action } => {
            let gateway = history_gateway(&settings);
            let mut controller = controller(&settings, gateway).await?;
            run_history_command(&mut controller, action).await
        }
    }
}

async fn run_history_command(
    controller: &mut WorkflowController,
    action: HistoryCommand,
) -> Result<ExitCode> {
    match action {
        HistoryCommand::List => {
            render::print_history(controller.history());
            Ok(ExitCode::SUCCESS)
        }
        HistoryCommand::Show { id, out } => {
            let id = HistoryItemId(id);
            if !controller.open_history_item(&id).await {
                eprintln!("No creation with id {id}.");
                return Ok(ExitCode::FAILURE);
            }
            let out = out.unwrap_or_else(|| PathBuf::from(format!("alterevo-{id}")));
            Ok(exit_code(render::render_screen(controller.screen(), &out)?))
        }
        HistoryCommand::Clear { yes } => {
            let confirmed = yes || render::confirm(CLEAR_HISTORY_QUESTION)?;
            let removed = controller.history().len();
            controller.clear_history(Confirmation::from(confirmed)).await;
            if confirmed {
                println!("Cleared {removed} creation(s).");
            } else {
                println!("History kept.");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn controller(
    settings: &Settings,
    gateway: Arc<dyn GenerationGateway>,
) -> Result<WorkflowController> {
    let kv = SqliteKeyValueStore::new(&settings.database_url)
        .await
        .context("failed to open history database")?;
    Ok(WorkflowController::bootstrap(
        gateway,
        HistoryStore::new(Arc::new(kv)),
        Arc::new(SystemClock),
    )
    .await)
}

fn http_gateway(settings: &Settings) -> Result<Arc<dyn GenerationGateway>> {
    let gateway = HttpGenerationGateway::new(settings.gateway_config()?)
        .context("failed to build HTTP client")?;
    Ok(Arc::new(gateway))
}

/// History commands never generate, so a missing API key is not an error here.
fn history_gateway(settings: &Settings) -> Arc<dyn GenerationGateway> {
    match http_gateway(settings) {
        Ok(gateway) => gateway,
        Err(err) => Arc::new(UnavailableGateway::new(format!("{err:#}"))),
    }
}

fn default_output_path(controller: &WorkflowController) -> PathBuf {
    match controller.history().get(0) {
        Some(item) => PathBuf::from(format!("alterevo-{}", item.id)),
        None => PathBuf::from("alterevo-output"),
    }
}

fn exit_code(rendered: Rendered) -> ExitCode {
    match rendered {
        Rendered::Result { .. } => ExitCode::SUCCESS,
        Rendered::Selection { .. } | Rendered::Loading => ExitCode::FAILURE,
    }
}
