use std::sync::Arc;

use tokio::{
	io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
	net::{TcpListener, TcpStream},
	sync::{watch, Semaphore},
};
use tracing::{debug, info, warn};

use crate::quota::{QuotaEngine, Verdict};

use super::{Command, Response};

// More than enough for one command line; anything longer is cut off and
// will answer as unknown
const MAX_LINE: u64 = 1024;

// Accepting stalls past this many in-flight connections instead of
// spawning without bound during a connection flood
const MAX_CONNECTIONS: usize = 256;

/// Waits for connections, dispatches a task to handle each one.
pub async fn listen(listener: TcpListener, engine: Arc<QuotaEngine>, mut rx: watch::Receiver<bool>) {
	let permits = Arc::new(Semaphore::new(MAX_CONNECTIONS));

	loop {
		let permit = tokio::select! {
			_ = rx.changed() => break,
			permit = permits.clone().acquire_owned() => match permit {
				Ok(permit) => permit,
				Err(_closed) => break,
			},
		};

		let accepted = tokio::select! {
			_ = rx.changed() => break,
			accepted = listener.accept() => accepted,
		};

		let (stream, client) = match accepted {
			Ok(accepted) => accepted,
			Err(err) => {
				warn!("accept failed: {}", err);
				continue;
			}
		};

		debug!("connection from {}", client);

		let engine = engine.clone();
		let rx = rx.clone();
		tokio::spawn(async move {
			let _permit = permit;
			serve(stream, engine, rx).await
		});
	}
}

// One command per connection: read a line, answer it, hang up.
async fn serve(
	mut stream: TcpStream,
	engine: Arc<QuotaEngine>,
	mut rx: watch::Receiver<bool>,
) -> io::Result<()> {
	let response = {
		let (read, _) = stream.split();
		let mut reader = BufReader::new(read).take(MAX_LINE);
		let mut buf = vec![];

		tokio::select! {
			_ = rx.changed() => return Ok(()),
			read = reader.read_until(b'\n', &mut buf) => {
				read?;
			}
		};

		dispatch(String::from_utf8_lossy(&buf).as_ref(), &engine).await
	};

	stream.write_all(response.as_bytes()).await?;
	stream.shutdown().await
}

async fn dispatch(line: &str, engine: &QuotaEngine) -> Response {
	let line = line.trim().to_lowercase();

	match line.parse() {
		Ok(Command::CheckQuota { mailbox, sender }) => {
			match engine.check(&mailbox, sender.as_deref()).await {
				Verdict::Accept => Response::Accept,
				Verdict::Block => Response::Block,
			}
		}
		Ok(Command::Ping) => Response::Pong,
		Err(err) => {
			info!("unrecognized command ({}): {:?}", err, line);
			Response::Unknown
		}
	}
}
