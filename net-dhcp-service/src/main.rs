//! net-dhcp: Docker network driver plugin daemon
//!
//! Connects to the Docker daemon, serves the NetworkDriver protocol on the
//! plugin socket and shuts down cleanly on SIGINT/SIGTERM.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use net_dhcp_plugin::{Plugin, PluginConfig, PluginError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(name = "net-dhcp")]
#[command(about = "Docker network driver plugin for networks on existing host bridges")]
struct Args {
    /// Socket to serve the plugin protocol on
    #[arg(
        long,
        env = "NET_DHCP_BIND_SOCK",
        default_value = "/run/docker/plugins/net-dhcp.sock"
    )]
    bind_sock: PathBuf,

    /// Docker daemon socket
    #[arg(long, env = "NET_DHCP_DOCKER_SOCK", default_value = "/run/docker.sock")]
    docker_sock: PathBuf,

    /// Docker Engine API version to request
    #[arg(
        long,
        env = "NET_DHCP_API_VERSION",
        default_value = net_dhcp_plugin::DEFAULT_API_VERSION
    )]
    api_version: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "NET_DHCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&args.log_level)
            .with_context(|| format!("invalid log level '{}'", args.log_level))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = config::load_environment();
    let args = Args::parse();
    init_tracing(&args)?;

    match env_file {
        Ok(Some(loaded)) => {
            info!(
                "Loaded {} environment variables from {}",
                loaded.applied,
                loaded.path.display()
            );
            for key in &loaded.skipped {
                debug!("Skipped (already set): {}", key);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("{:#}", e),
    }

    let plugin_config = PluginConfig::new()
        .docker_socket(&args.docker_sock)
        .api_version(&args.api_version);
    let plugin = Arc::new(
        Plugin::connect(plugin_config)
            .await
            .context("failed to create plugin")?,
    );

    let mut server = tokio::spawn({
        let plugin = Arc::clone(&plugin);
        let bind_sock = args.bind_sock.clone();
        async move { plugin.listen(&bind_sock).await }
    });

    let finished = tokio::select! {
        res = &mut server => Some(res),
        _ = shutdown_signal() => None,
    };

    match plugin.close().await {
        Ok(()) => {}
        Err(PluginError::Close(errors)) => {
            for e in errors.iter() {
                error!("{}", e);
            }
        }
        Err(e) => error!("Failed to close plugin: {}", e),
    }

    let served = match finished {
        Some(res) => res,
        None => server.await,
    };
    served
        .context("plugin server task failed")?
        .context("plugin server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["net-dhcp"]).unwrap();
        if std::env::var_os("NET_DHCP_BIND_SOCK").is_none() {
            assert_eq!(
                args.bind_sock,
                PathBuf::from("/run/docker/plugins/net-dhcp.sock")
            );
        }
        if std::env::var_os("NET_DHCP_API_VERSION").is_none() {
            assert_eq!(args.api_version, "1.41");
        }
        assert_eq!(args.log_format, LogFormat::Text);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "net-dhcp",
            "--bind-sock",
            "/tmp/test.sock",
            "--docker-sock",
            "/tmp/docker.sock",
            "--api-version",
            "1.44",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.bind_sock, PathBuf::from("/tmp/test.sock"));
        assert_eq!(args.docker_sock, PathBuf::from("/tmp/docker.sock"));
        assert_eq!(args.api_version, "1.44");
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_log_format() {
        assert!(Args::try_parse_from(["net-dhcp", "--log-format", "xml"]).is_err());
    }
}
