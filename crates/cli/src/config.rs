//! Command-line options and the script runner.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use corelib::partitioner::{MixPartitioner, Partitioner, SipPartitioner, Xxh3Partitioner};
use corelib::{ClusterConfig, Coordinator};

use crate::commands::{Command, CommandResult};

/// Hash family used to place nodes and documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartitionerKind {
    Mix,
    Xxh3,
    Sip,
}

/// Replays a command script against a simulated cache tier.
#[derive(Debug, Parser)]
#[command(name = "docring", version, about = "Sharded document cache simulator")]
pub struct CliConfig {
    /// Command script to run; stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// JSON file with cluster settings. Flags below override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub max_nodes: Option<usize>,

    #[arg(long)]
    pub queue_capacity: Option<usize>,

    #[arg(long, value_enum, default_value_t = PartitionerKind::Mix)]
    pub partitioner: PartitionerKind,

    /// Accepted for compatibility; every node still gets one token.
    #[arg(long)]
    pub vnodes: bool,

    /// Emit one JSON object per result instead of text lines.
    #[arg(long)]
    pub json: bool,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl CliConfig {
    /// Cluster settings from the config file (or defaults) plus flag overrides.
    pub fn cluster_config(&self) -> anyhow::Result<ClusterConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => ClusterConfig::default(),
        };
        if let Some(max_nodes) = self.max_nodes {
            config = config.with_max_nodes(max_nodes);
        }
        if let Some(queue_capacity) = self.queue_capacity {
            config = config.with_queue_capacity(queue_capacity);
        }
        if self.vnodes {
            config = config.with_vnodes(true);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let config = self.cluster_config()?;
        let input: Box<dyn BufRead> = match &self.input {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
            )),
            None => Box::new(io::stdin().lock()),
        };
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.partitioner {
            PartitionerKind::Mix => {
                let coordinator = Coordinator::with_partitioner(config, MixPartitioner)?;
                self.replay(coordinator, input, &mut out)
            }
            PartitionerKind::Xxh3 => {
                let coordinator = Coordinator::with_partitioner(config, Xxh3Partitioner)?;
                self.replay(coordinator, input, &mut out)
            }
            PartitionerKind::Sip => {
                let coordinator = Coordinator::with_partitioner(config, SipPartitioner)?;
                self.replay(coordinator, input, &mut out)
            }
        }
    }

    /// Executes every line of `input`, writing results to `out`.
    ///
    /// Bad lines and refused commands produce an error line; processing
    /// carries on with the next line.
    pub fn replay<P, R, W>(
        &self,
        mut coordinator: Coordinator<P>,
        input: R,
        out: &mut W,
    ) -> anyhow::Result<()>
    where
        P: Partitioner,
        R: BufRead,
        W: Write,
    {
        info!(partitioner = coordinator.ring().partitioner_name(), "replaying commands");
        let mut executed = 0usize;
        let mut failed = 0usize;

        for (index, line) in input.lines().enumerate() {
            let line = line.context("failed to read command")?;
            let lineno = index + 1;

            let result = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(command)) => command.execute(&mut coordinator).map_err(anyhow::Error::from),
                Err(err) => Err(err),
            };

            match result {
                Ok(result) => {
                    executed += 1;
                    for rendered in result.render(self.json)? {
                        writeln!(out, "{rendered}")?;
                    }
                }
                Err(err) => {
                    failed += 1;
                    warn!(line = lineno, error = %err, "command failed");
                    if self.json {
                        let value = serde_json::json!({
                            "result": "error",
                            "line": lineno,
                            "error": err.to_string(),
                        });
                        writeln!(out, "{value}")?;
                    } else {
                        writeln!(out, "[Error] line {lineno}: {err:#}")?;
                    }
                }
            }
        }

        let applied = coordinator.flush_all()?;
        if !applied.is_empty() {
            info!(count = applied.len(), "drained deferred edits");
            let drained = CommandResult::Drained { applied };
            for rendered in drained.render(self.json)? {
                writeln!(out, "{rendered}")?;
            }
        }

        out.flush()?;
        info!(executed, failed, "replay finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("docring").chain(args.iter().copied()))
            .unwrap()
    }

    fn replay(config: &CliConfig, script: &str) -> String {
        let coordinator = Coordinator::new(config.cluster_config().unwrap()).unwrap();
        let mut out = Vec::new();
        config
            .replay(coordinator, script.as_bytes(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_flag_overrides() {
        let config = cli(&["--max-nodes", "3", "--queue-capacity", "5", "--vnodes"]);
        let cluster = config.cluster_config().unwrap();
        assert_eq!(cluster.max_nodes, 3);
        assert_eq!(cluster.queue_capacity, 5);
        assert!(cluster.enable_vnodes);
        assert_eq!(config.partitioner, PartitionerKind::Mix);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let config = cli(&["--queue-capacity", "0"]);
        assert!(config.cluster_config().is_err());
        assert!(CliConfig::try_parse_from(["docring", "--partitioner", "md5"]).is_err());
    }

    #[test]
    fn test_replay_continues_after_errors() {
        let config = cli(&[]);
        let output = replay(
            &config,
            "# warm up\nADD_SERVER 1 2\nBOGUS\nREMOVE_SERVER 9\n\nEDIT a \"x y\"\nGET a\n",
        );
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "[Server 1]-Log: joined an empty ring");
        assert!(lines[1].starts_with("[Error] line 3:"));
        assert!(lines[2].starts_with("[Error] line 4:"));
        assert!(lines.contains(&"[Server 1]-Response: x y"));
    }

    #[test]
    fn test_replay_drains_trailing_edits() {
        let config = cli(&[]);
        let output = replay(&config, "ADD_SERVER 1 2\nEDIT a one\nEDIT b two\n");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            &lines[lines.len() - 4..],
            &[
                "[Server 1]-Response: Document a has been created",
                "[Server 1]-Log: Cache MISS for a",
                "[Server 1]-Response: Document b has been created",
                "[Server 1]-Log: Cache MISS for b",
            ]
        );
    }

    #[test]
    fn test_replay_json_errors() {
        let config = cli(&["--json"]);
        let output = replay(&config, "GET a\n");
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["result"], "error");
        assert_eq!(value["line"], 1);
    }
}
