use anyhow::Context;
use clap::{Parser, Subcommand};

use bex_core::script::{Op, ScriptedProgram};
use bex_core::session::RequestSession;

#[derive(Parser)]
#[command(name = "bex")]
#[command(about = "Batch request lifecycle driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted request file and print the outcome record
    Run {
        /// JSON file with a `payload` and an `ops` instruction list
        file: std::path::PathBuf,
    },
}

#[derive(serde::Deserialize)]
struct RequestFile {
    payload: serde_json::Value,
    ops: Vec<Op>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let request: RequestFile =
                serde_json::from_str(&raw).context("Failed to parse request file")?;

            let mut session = RequestSession::new(request.payload);
            let outcome = session
                .dispatch(ScriptedProgram::new(request.ops), |pending| async move {
                    // Yielded values resolve to themselves; a real driver
                    // would await the network here.
                    Ok(pending)
                })
                .await;

            println!("{}", serde_json::to_string_pretty(session.record())?);

            outcome.context("Request failed")?;
        }
    }

    Ok(())
}
