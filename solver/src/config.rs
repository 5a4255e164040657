//! Bootstrap configuration (§4.10): `--rank`/`--peers`/`--world-size`
//! flags, falling back to `SOLVER_RANK`/`SOLVER_PEERS`/`SOLVER_WORLD_SIZE`
//! environment variables. Hand-rolled rather than pulled in from a CLI
//! framework -- a three-flag bootstrap script doesn't earn one.

use engine::SolverError;
use protocol::RankId;
use std::net::SocketAddr;
#[cfg(feature = "persistent-cache")]
use std::path::PathBuf;

pub struct Config {
    pub rank: RankId,
    pub peers: Vec<SocketAddr>,
    /// Directory for the `persistent-cache` spill log, set via
    /// `--persistent-cache-dir` or `SOLVER_PERSISTENT_CACHE_DIR` (§4.12).
    /// `None` runs the plain in-memory tables.
    #[cfg(feature = "persistent-cache")]
    pub persistent_cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: impl Iterator<Item = String>) -> Result<Self, SolverError> {
        let mut rank: Option<RankId> = std::env::var("SOLVER_RANK").ok().and_then(|v| v.parse().ok());
        let mut world_size: Option<u32> =
            std::env::var("SOLVER_WORLD_SIZE").ok().and_then(|v| v.parse().ok());
        let mut peers_raw: Option<String> = std::env::var("SOLVER_PEERS").ok();
        #[cfg(feature = "persistent-cache")]
        let mut persistent_cache_dir: Option<PathBuf> = std::env::var("SOLVER_PERSISTENT_CACHE_DIR")
            .ok()
            .map(PathBuf::from);

        let mut args = args.skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--rank" => {
                    let value = args
                        .next()
                        .ok_or_else(|| SolverError::Config("--rank needs a value".into()))?;
                    rank = Some(
                        value
                            .parse()
                            .map_err(|_| SolverError::Config(format!("invalid --rank {value}")))?,
                    );
                }
                "--world-size" => {
                    let value = args
                        .next()
                        .ok_or_else(|| SolverError::Config("--world-size needs a value".into()))?;
                    world_size = Some(value.parse().map_err(|_| {
                        SolverError::Config(format!("invalid --world-size {value}"))
                    })?);
                }
                "--peers" => {
                    peers_raw = Some(
                        args.next()
                            .ok_or_else(|| SolverError::Config("--peers needs a value".into()))?,
                    );
                }
                #[cfg(feature = "persistent-cache")]
                "--persistent-cache-dir" => {
                    let value = args.next().ok_or_else(|| {
                        SolverError::Config("--persistent-cache-dir needs a value".into())
                    })?;
                    persistent_cache_dir = Some(PathBuf::from(value));
                }
                other => {
                    return Err(SolverError::Config(format!("unrecognized argument {other}")));
                }
            }
        }

        let rank = rank.ok_or_else(|| SolverError::Config("missing --rank (or SOLVER_RANK)".into()))?;
        let peers_raw =
            peers_raw.ok_or_else(|| SolverError::Config("missing --peers (or SOLVER_PEERS)".into()))?;

        let peers: Vec<SocketAddr> = peers_raw
            .split(',')
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|_| SolverError::Config(format!("invalid peer address {s}")))
            })
            .collect::<Result<_, _>>()?;

        if let Some(world_size) = world_size {
            if world_size as usize != peers.len() {
                return Err(SolverError::Config(format!(
                    "--world-size {world_size} does not match {} peer addresses",
                    peers.len()
                )));
            }
        }

        if rank as usize >= peers.len() {
            return Err(SolverError::Config(format!(
                "--rank {rank} is out of range for a {}-peer fleet",
                peers.len()
            )));
        }

        Ok(Config {
            rank,
            peers,
            #[cfg(feature = "persistent-cache")]
            persistent_cache_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("solver".to_string()).chain(parts.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_rank_and_peers_from_flags() {
        let config =
            Config::from_args(args(&["--rank", "1", "--peers", "127.0.0.1:9000,127.0.0.1:9001"]))
                .unwrap();
        assert_eq!(config.rank, 1);
        assert_eq!(config.peers.len(), 2);
    }

    #[test]
    fn rejects_a_rank_outside_the_fleet() {
        let result =
            Config::from_args(args(&["--rank", "5", "--peers", "127.0.0.1:9000,127.0.0.1:9001"]));
        assert!(result.is_err());
    }

    #[cfg(feature = "persistent-cache")]
    #[test]
    fn parses_a_persistent_cache_directory() {
        let config = Config::from_args(args(&[
            "--rank",
            "0",
            "--peers",
            "127.0.0.1:9000",
            "--persistent-cache-dir",
            "/tmp/solver-cache",
        ]))
        .unwrap();
        assert_eq!(
            config.persistent_cache_dir,
            Some(std::path::PathBuf::from("/tmp/solver-cache"))
        );
    }

    #[test]
    fn rejects_a_mismatched_world_size() {
        let result = Config::from_args(args(&[
            "--rank",
            "0",
            "--world-size",
            "3",
            "--peers",
            "127.0.0.1:9000,127.0.0.1:9001",
        ]));
        assert!(result.is_err());
    }
}
