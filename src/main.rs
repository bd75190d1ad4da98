mod adapter;
mod command;
mod config;
mod safety;

use adapter::SystemLauncher;
use anyhow::{bail, Context, Result};
use command::{CommandExecutor, CommandResult};
use config::DeviceConfig;
use safety::{cancel_pair, CancelToken};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Usage:
///   yakapi-device              read commands from stdin, one per line
///   yakapi-device <verb> [arg] execute a single command
///   yakapi-device script       stream stdin to the script adapter
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = DeviceConfig::from_env().context("invalid device configuration")?;

    info!("YakAPI device starting");
    info!("  motor adapter: {}", describe(&config.adapters.motor_adapter));
    info!("  script adapter: {}", describe(&config.adapters.script_adapter));
    info!("  adapter call timeout: {:?}", config.adapters.call_timeout);

    let executor = CommandExecutor::new(&config, Arc::new(SystemLauncher));

    // Ctrl-C interrupts the current hold; the stop call still goes out
    let (cancel_handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping current command");
            cancel_handle.cancel();
        }
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("script") => run_script(&executor, &cancel).await,
        Some(_) => run_once(&executor, &args.join(" "), &cancel).await,
        None => run_lines(&executor, &cancel).await,
    }
}

fn describe(adapter: &Option<PathBuf>) -> String {
    adapter
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<not configured>".into())
}

async fn run_once(executor: &CommandExecutor, line: &str, cancel: &CancelToken) -> Result<()> {
    let outcome = executor.execute(line, cancel).await?;
    println!("{}", outcome);
    Ok(())
}

async fn run_script(executor: &CommandExecutor, cancel: &CancelToken) -> Result<()> {
    let result = executor.run_script(tokio::io::stdin(), cancel).await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(result.output.as_bytes()).await?;
    stdout.flush().await?;
    info!("Script completed: {} bytes of output", result.bytes);
    Ok(())
}

/// Execute commands from stdin until EOF or interrupt
async fn run_lines(executor: &CommandExecutor, cancel: &CancelToken) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading commands from stdin")?,
            _ = cancel.cancelled() => break,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let result = executor.execute(&line, cancel).await;
        match CommandResult::from_execution(&result) {
            CommandResult::Completed { message } => println!("ok: {}", message),
            CommandResult::Rejected { message } | CommandResult::Failed { message } => {
                println!("error: {}", message)
            }
            CommandResult::Critical { message } => {
                error!("Motors may still be running, refusing further commands");
                bail!("critical: {}", message);
            }
        }

        if cancel.is_cancelled() {
            break;
        }
    }

    info!("Command input closed");
    Ok(())
}
