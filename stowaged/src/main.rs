mod config;
mod mailer;

use std::sync::Arc;

use config::Config;
use mailer::SendmailMailer;
use stowage::{proto, quota::QuotaEngine};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
	let config = match Config::get() {
		Some(conf) => conf,
		None => return,
	};

	if let Err(err) = init_logging(&config) {
		eprintln!("failed to open log file {}: {}", config.log.display(), err);
		std::process::exit(1);
	}

	let address = config.socket_address();
	let listener = match TcpListener::bind(address).await {
		Ok(listener) => listener,
		Err(err) => {
			eprintln!("Can't open socket on {}: {}", address, err);
			std::process::exit(1);
		}
	};

	if config.debug {
		println!("Listening on {} for debug purpose", address);
	}

	let engine = match QuotaEngine::new(config.engine, Arc::new(SendmailMailer)) {
		Ok(engine) => engine,
		Err(err) => {
			eprintln!("Can't create the state directories: {}", err);
			std::process::exit(1);
		}
	};

	info!("listening on {}", address);

	let (tx, rx) = tokio::sync::watch::channel(false);
	let listen_task = tokio::spawn(proto::listen(listener, Arc::new(engine), rx));

	wait_for_shutdown().await;

	info!("received shutdown signal, closing");
	#[allow(unused_must_use)]
	{
		tx.send(true);
		listen_task.await;
	}
}

// An append-only file log, echoed to stdout when running with -d
fn init_logging(config: &Config) -> std::io::Result<()> {
	let file = std::fs::OpenOptions::new()
		.append(true)
		.create(true)
		.open(&config.log)?;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let echo = config.debug.then(|| fmt::layer().with_target(false));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_ansi(false)
				.with_target(false)
				.with_writer(std::sync::Mutex::new(file)),
		)
		.with(echo)
		.init();

	Ok(())
}

async fn wait_for_shutdown() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{signal, SignalKind};

		let mut terminate =
			signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

		tokio::select! {
			_ = tokio::signal::ctrl_c() => (),
			_ = terminate.recv() => (),
		}
	}

	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
	}
}
