mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agora_messenger::loader::LoadState;
use agora_messenger::room_service::RoomService;
use agora_messenger::rooms::RoomLoader;
use agora_messenger::Room;
use agora_utils::async_utils;

use config::{Args, Backend, Config, EnvVars};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agora_messenger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::resolve(args, &EnvVars::from_process())?;
    tracing::info!(env = ?config.app_env, backend = ?config.backend, "Configuration loaded");

    let cancellation_token = make_cancellation_token();

    match &config.backend {
        Backend::Mock => {
            run_client(mock_db::Db::new(), &config, cancellation_token).await?;
        },
        Backend::File(path) => {
            run_client(json_db::Db::new(path), &config, cancellation_token).await?;
        },
    }

    Ok(())
}

async fn run_client<S: RoomService>(service: S, config: &Config, cancellation_token: CancellationToken) -> Result<()> {
    let loader = RoomLoader::new(service);

    let mut settled_states = async_utils::pipe_watch(loader.subscribe(), |state: &LoadState<Vec<Room>>| {
        if state.is_loading() { None } else { Some(state.clone()) }
    });
    let printer = tokio::spawn(async move {
        while let Some(state) = settled_states.recv().await {
            print_state(&state);
        }
    });

    loader.load_rooms().await;

    if let Some(reload_every) = config.reload_every {
        let mut interval = tokio::time::interval(reload_every);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = interval.tick() => loader.load_rooms().await,
            }
        }
    }

    if let Some(path) = &config.export {
        json_db::Db::new(path)
            .store(&loader.rooms()).await
            .with_context(|| format!("Couldn't export rooms to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Rooms exported");
    }

    let last_error = loader.last_error();
    drop(loader);
    printer.await.context("Join error in task printing room updates")?;

    if let Some(error) = last_error {
        bail!("Couldn't load rooms: {error}");
    }
    Ok(())
}

fn print_state(state: &LoadState<Vec<Room>>) {
    if let Some(error) = state.last_error() {
        tracing::warn!("Last load failed, showing previous rooms: {error}");
    }
    println!("{} room(s)", state.data().len());
    for room in state.data() {
        let owner = room.owner_user().map(|user| user.username.as_str()).unwrap_or("<unknown>");
        println!(
            "  {} ({} users, {} messages, owner {owner})",
            room.name,
            room.users.len(),
            room.messages.len(),
        );
    }
}

fn make_cancellation_token() -> CancellationToken {
    let cancellation_token = CancellationToken::new();

    let cloned_token = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
            },
            Err(err) => {
                tracing::error!("Unable to listen for shutdown signal: {}", err);
            },
        };
        cloned_token.cancel();
    });

    cancellation_token
}
