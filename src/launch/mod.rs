//! Emulator process launcher
//!
//! Starts the configured hub, agent, and panel emulator binaries in
//! topology order (hub, then each agent, then its panels) and streams every
//! child's stdout into the log, tagged with the process name. Children are
//! killed when the launcher task is dropped.

use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command as ProcessCommand};
use tracing::{info, warn};

use crate::config::LaunchConfig;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Failed to start {name}: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },

    #[error("No binaries configured under [launch]")]
    NothingToLaunch,
}

pub type LaunchResult<T> = Result<T, LaunchError>;

/// One spawned child with its log tag
struct Process {
    name: String,
    child: Child,
}

/// Spawn everything described by `launch` and wait until all children exit.
pub async fn run(launch: &LaunchConfig) -> LaunchResult<()> {
    let mut processes = Vec::new();

    if let Some(hub_bin) = &launch.hub_bin {
        processes.push(spawn(hub_bin, &[], "hub")?);
    }

    for agent in &launch.agents {
        let name = format!("agent-{}", agent.mac);
        if let Some(agent_bin) = &launch.agent_bin {
            let args = [
                "-m".to_string(),
                agent.mac.to_string(),
                "-p".to_string(),
                agent.hub_port.to_string(),
                "-s".to_string(),
                agent.hub_host.clone(),
                "-l".to_string(),
                agent.bacnet_port.to_string(),
            ];
            processes.push(spawn(agent_bin, &args, &name)?);
        }

        if let Some(emulator_bin) = &launch.emulator_bin {
            for panel in &agent.panels {
                let args = [
                    "-i".to_string(),
                    agent.hub_host.clone(),
                    "-p".to_string(),
                    agent.bacnet_port.to_string(),
                    "-u".to_string(),
                    panel.uuid.to_string(),
                    "-m".to_string(),
                    panel.mac.to_string(),
                ];
                processes.push(spawn(emulator_bin, &args, &format!("panel-{}", panel.mac))?);
            }
        }
    }

    if processes.is_empty() {
        return Err(LaunchError::NothingToLaunch);
    }
    info!(count = processes.len(), "Launched emulator processes");

    for process in &mut processes {
        match process.child.wait().await {
            Ok(status) => info!(name = %process.name, %status, "Process exited"),
            Err(e) => warn!(name = %process.name, error = %e, "Failed to wait for process"),
        }
    }
    Ok(())
}

fn spawn(bin: &Path, args: &[String], name: &str) -> LaunchResult<Process> {
    info!(name, bin = %bin.display(), ?args, "Starting process");
    let mut child = ProcessCommand::new(bin)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            name: name.to_string(),
            source,
        })?;

    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, name.to_string());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, name.to_string());
    }

    Ok(Process {
        name: name.to_string(),
        child,
    })
}

fn forward_lines<R>(reader: R, name: String)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(process = %name, "{}", line);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_launch_config_is_an_error() {
        let err = run(&LaunchConfig::default()).await.unwrap_err();
        assert!(matches!(err, LaunchError::NothingToLaunch));
    }

    #[tokio::test]
    async fn test_spawn_failure_names_the_process() {
        let launch = LaunchConfig {
            hub_bin: Some("/nonexistent/panl-hub".into()),
            ..Default::default()
        };
        let err = run(&launch).await.unwrap_err();
        match err {
            LaunchError::Spawn { name, .. } => assert_eq!(name, "hub"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
