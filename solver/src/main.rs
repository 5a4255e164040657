//! Bootstraps one rank of the fleet: parses configuration, sets up
//! structured logging, builds the TCP mesh, and runs the worker loop on a
//! blocking thread (§5).

mod config;

use config::Config;
use engine::Worker;
use tic_tac_toe::TicTacToe;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_args(std::env::args())?;
    tracing::info!(
        rank = config.rank,
        world_size = config.peers.len(),
        "starting solver rank"
    );

    let mesh = transport::TcpTransport::connect(config.rank, config.peers).await?;

    #[cfg(feature = "persistent-cache")]
    let outcome = tokio::task::spawn_blocking(move || -> Result<_, engine::SolverError> {
        let mut worker = match &config.persistent_cache_dir {
            Some(dir) => Worker::with_persistent_cache(TicTacToe, mesh, dir)
                .map_err(|e| engine::SolverError::Config(e.to_string()))?,
            None => Worker::new(TicTacToe, mesh),
        };
        worker.run()
    })
    .await??;

    #[cfg(not(feature = "persistent-cache"))]
    let outcome = tokio::task::spawn_blocking(move || {
        let mut worker = Worker::new(TicTacToe, mesh);
        worker.run()
    })
    .await??;

    if let Some((outcome, remoteness)) = outcome {
        println!("{} in {} moves", outcome.as_str(), remoteness);
    }

    Ok(())
}
