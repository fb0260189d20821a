use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rabbit_facade::config::{self, FacadeConfig, CONFIG_FILE_NAME};
use rabbit_facade::{env, logging, ConsumeOptions, Facade};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const USAGE: &str = "\
Usage:
  rabbit_facade publish <exchange> <routing_key> <json>
  rabbit_facade send-file <path> <exchange> <routing_key>
  rabbit_facade consume <queue>
  rabbit_facade receive <queue> [storage_dir]
  rabbit_facade init-config [path]";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    let rest = &args[1..];

    if command == "init-config" {
        let path = rest.first().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        config::create_default_config_file(&path)?;
        println!("Configuration file created at: {}", path.display());
        return Ok(());
    }

    let settings = load_settings()?;
    let facade = Facade::instance(settings.connection.params())
        .await
        .context("Failed to connect to RabbitMQ")?;

    let outcome = run(&facade, &settings, command, rest).await;

    if let Err(e) = facade.close().await {
        warn!("Error while closing the connection: {}", e);
    }
    outcome
}

async fn run(facade: &Arc<Facade>, settings: &FacadeConfig, command: &str, rest: &[String]) -> Result<()> {
    match (command, rest) {
        ("publish", [exchange, routing_key, body]) => {
            let message: Value = serde_json::from_str(body).context("Message must be valid JSON")?;
            facade.publish(&message, exchange, routing_key).await?;
            info!("Published message to '{}' with routing key '{}'", exchange, routing_key);
        }
        ("send-file", [path, exchange, routing_key]) => {
            facade.publish_file(path, Map::new(), exchange, routing_key).await?;
            info!("Published file {} to '{}'", path, exchange);
        }
        ("consume", [queue]) => {
            facade
                .consume_with(queue, ConsumeOptions::default(), shutdown_token(), |message| {
                    println!(" [x] Received {}", message.text());
                    futures::future::ready(())
                })
                .await?;
        }
        ("receive", [queue, storage @ ..]) if storage.len() <= 1 => {
            let storage_dir = storage
                .first()
                .map(PathBuf::from)
                .unwrap_or_else(|| settings.file_transfer.storage_dir.clone());
            receive_files(facade, queue, &storage_dir).await?;
        }
        _ => bail!("Unrecognized command.\n{}", USAGE),
    }
    Ok(())
}

async fn receive_files(facade: &Arc<Facade>, queue: &str, storage_dir: &Path) -> Result<()> {
    facade
        .consume_with(queue, ConsumeOptions::default(), shutdown_token(), |message| {
            let facade = Arc::clone(facade);
            let storage_dir = storage_dir.to_path_buf();
            async move {
                match facade.store_file_return_message(&storage_dir, &message.data).await {
                    Ok(payload) => println!(" [x] Received {}", payload),
                    Err(e) => error!("Failed to store received message: {}", e),
                }
            }
        })
        .await?;
    Ok(())
}

/// Cancelled on Ctrl+C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
        }
        trigger.cancel();
    });
    println!(" [*] Waiting for messages. To exit press CTRL+C");
    token
}

fn load_settings() -> Result<FacadeConfig> {
    match config::find_config_file() {
        Ok(path) => config::load_config_from(&path),
        Err(_) => env::load(),
    }
}
