// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! gluru support server binary.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use gluru_server::{build_scheduler, recipients_from_config, version, EventDispatcher, Stores};
use gluru_server_config::{LogFormat, ServerConfig};
use gluru_server_db::{create_pool, run_migrations, RoleStore};
use gluru_server_jobs::{Dispatcher, NotificationQueue, Transports};
use gluru_server_notify::{BuiltinRenderer, NotificationPlanner};
use gluru_server_sms::SmsClient;
use gluru_server_smtp::SmtpClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// gluru server - support ticketing core with notification dispatch.
#[derive(Parser, Debug)]
#[command(name = "gluru-server", about = "gluru support ticketing server", version)]
struct Args {
	/// Path to a TOML config file, overriding the system location.
	#[arg(long, short)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

fn init_tracing(config: &ServerConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let (pretty, json) = match config.logging.format {
		LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
		LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(pretty)
		.with(json)
		.init();
}

fn build_transports(config: &ServerConfig) -> anyhow::Result<Transports> {
	let mut transports = Transports::new(Arc::new(BuiltinRenderer::new()));

	match &config.smtp {
		Some(smtp) => {
			let client = SmtpClient::new(smtp).context("invalid SMTP configuration")?;
			transports = transports.with_email(Arc::new(client));
		}
		None => tracing::warn!("SMTP not configured; email notifications will be rejected"),
	}

	match &config.sms {
		Some(sms) => {
			let client = SmsClient::new(sms).context("invalid SMS configuration")?;
			transports = transports.with_sms(Arc::new(client));
		}
		None => tracing::info!("SMS not configured; urgent-ticket paging disabled"),
	}

	Ok(transports)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => gluru_server_config::load_config_with_file(path),
		None => gluru_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	init_tracing(&config);

	tracing::info!(
		database = %config.database.url,
		base_url = %config.http.base_url,
		version = version::VERSION,
		"starting gluru-server"
	);

	let pool = create_pool(&config.database.url, config.database.max_connections).await?;
	run_migrations(&pool).await?;

	let stores = Stores::new(pool);
	let seeded = stores.roles.seed_builtin_roles().await?;
	if seeded > 0 {
		tracing::info!(seeded, "seeded built-in roles");
	}
	let roles = Arc::new(stores.roles.load_registry().await?);

	let dispatcher = Dispatcher::new(&config.dispatch, build_transports(&config)?);
	dispatcher.start().await?;

	let planner = Arc::new(NotificationPlanner::new(recipients_from_config(
		&config.notifications,
		&config.http,
	)));
	let queue: Arc<dyn NotificationQueue> = Arc::new(dispatcher.queue());
	let events = EventDispatcher::new(stores, roles, planner, queue);

	let scheduler = build_scheduler(&config.dispatch, events);
	if let Err(e) = scheduler.start().await {
		tracing::error!(error = %e, "Failed to start job scheduler");
	}

	tracing::info!("gluru-server running notification dispatcher and background jobs; no request surface in this process");

	tokio::signal::ctrl_c().await?;
	tracing::info!("Received shutdown signal");

	scheduler.shutdown().await;
	let jobs = scheduler.health_status().await;
	let health = dispatcher.health();
	dispatcher.shutdown().await;
	tracing::info!(?health, ?jobs, "Server shutdown complete");

	Ok(())
}
