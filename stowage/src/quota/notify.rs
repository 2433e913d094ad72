use std::{
	fs::{self, OpenOptions},
	io::{self, Write},
	path::PathBuf,
	sync::Arc,
	time::SystemTime,
};

use gethostname::gethostname;
use rand::Rng;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, info, warn};

use crate::args::Address;

use super::engine::{Classification, Usage};

/// The two durable notification states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
	Warning,
	Blocked,
}

impl MarkerKind {
	fn dirname(self) -> &'static str {
		match self {
			Self::Warning => "warning",
			Self::Blocked => "blocked",
		}
	}
}

/// Presence-of-a-file booleans, one per mailbox and kind, under the
/// state directory. A marker's only content is when the state was
/// entered. A restart sees whatever markers exist on disk.
#[derive(Clone, Debug)]
pub struct MarkerStore {
	base: PathBuf,
}

impl MarkerStore {
	pub fn new<B: Into<PathBuf>>(base: B) -> Self {
		Self { base: base.into() }
	}

	/// Create the marker directories if they aren't there yet.
	pub fn create_directories(&self) -> io::Result<()> {
		for kind in [MarkerKind::Warning, MarkerKind::Blocked] {
			fs::create_dir_all(self.base.join(kind.dirname()))?;
		}
		fs::create_dir_all(self.base.join("tmp"))
	}

	fn marker_path(&self, kind: MarkerKind, mailbox: &Address) -> PathBuf {
		self.base.join(kind.dirname()).join(mailbox.to_string())
	}

	pub fn is_set(&self, kind: MarkerKind, mailbox: &Address) -> bool {
		self.marker_path(kind, mailbox).exists()
	}

	/// Set a marker by writing a tmp file and renaming it into place, so
	/// a crash mid-write never leaves a half-visible marker.
	pub fn enter(&self, kind: MarkerKind, mailbox: &Address) -> io::Result<()> {
		let tmp = self.base.join("tmp").join(Self::unique_name());

		{
			let mut file = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
			let entered = OffsetDateTime::now_utc()
				.format(&Rfc3339)
				.unwrap_or_default();
			file.write_all(entered.as_bytes())?;
		}

		fs::rename(tmp, self.marker_path(kind, mailbox))
	}

	/// Clear a marker. Clearing one that isn't set is fine.
	pub fn leave(&self, kind: MarkerKind, mailbox: &Address) -> io::Result<()> {
		match fs::remove_file(self.marker_path(kind, mailbox)) {
			Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
			_ => Ok(()),
		}
	}

	fn unique_name() -> String {
		let time = SystemTime::now()
			.duration_since(SystemTime::UNIX_EPOCH)
			.unwrap_or_default();
		let middle: u32 = rand::thread_rng().gen();
		let hostname = gethostname().to_string_lossy().replace('/', "-");

		format!("{}.{:08x}.{}", time.as_secs(), middle, hostname)
	}
}

/// One outbound notification, composed and ready for a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
	pub to: String,
	pub from: String,
	pub subject: String,
	pub body: String,
}

#[derive(Error, Debug)]
pub enum MailError {
	#[error("could not run the mail transport: {0}")]
	Transport(#[from] io::Error),
	#[error("mail transport exited with {0}")]
	Failed(std::process::ExitStatus),
}

/// Hands a finished notice to whatever actually delivers mail.
///
/// Failures are logged by the notifier and swallowed; they never reach
/// the wire.
pub trait Mailer: Send + Sync {
	fn send(&self, notice: &Notice) -> Result<(), MailError>;
}

const DEFAULT_FROM: &str = "Mail Service <postmaster@localhost>";
const WARNING_SUBJECT: &str = "Warning: mailbox almost full";
const BLOCKED_SUBJECT: &str = "Mailbox full: incoming mail suspended";

const WARNING_BODY: &str = "\
This is an automated message from your mail service.

The mailbox %email% is close to its storage limit.

You are using %used%.
The limit is %limit%.

Please delete old messages from the server soon. Once the limit is
reached, no new mail can be received for this mailbox.
";

const BLOCKED_BODY: &str = "\
This is an automated message from your mail service.

The mailbox %email% has gone over its storage limit.

You are using %used%.
The limit is %limit%.

No new mail can be received for this mailbox until old messages are
deleted from the server.
";

/// Sender and subject lines for outbound notices.
#[derive(Clone, Debug)]
pub struct MailSettings {
	pub from: String,
	pub warning_subject: String,
	pub blocked_subject: String,
}

impl Default for MailSettings {
	fn default() -> Self {
		Self {
			from: DEFAULT_FROM.into(),
			warning_subject: WARNING_SUBJECT.into(),
			blocked_subject: BLOCKED_SUBJECT.into(),
		}
	}
}

/// Decimal gigabytes with two places, the way sizes appear in log lines
/// and notices.
pub fn format_gb(bytes: u64) -> String {
	format!("{:.2} GB", bytes as f64 / 1_000_000_000.0)
}

/// Applies the warning/blocked transition table to freshly computed
/// usage, firing each notice at most once per entry into a state.
///
/// The caller is responsible for serializing observations per mailbox;
/// the engine does so by driving this from inside the cache's per-key
/// critical section.
#[derive(Clone)]
pub struct Notifier {
	markers: MarkerStore,
	mailer: Arc<dyn Mailer>,
	settings: MailSettings,
}

impl Notifier {
	pub fn new(markers: MarkerStore, mailer: Arc<dyn Mailer>, settings: MailSettings) -> Self {
		Self {
			markers,
			mailer,
			settings,
		}
	}

	/// Drive the state machine with one fresh classification. Marker and
	/// transport trouble is logged; the verdict never depends on it.
	pub fn observe(&self, mailbox: &Address, usage: &Usage) {
		match usage.classification {
			Classification::Good => {
				self.clear(MarkerKind::Warning, mailbox);
				self.clear(MarkerKind::Blocked, mailbox);
			}
			Classification::Warning => {
				self.clear(MarkerKind::Blocked, mailbox);
				self.enter_once(MarkerKind::Warning, mailbox, usage);
			}
			Classification::Blocked => {
				self.clear(MarkerKind::Warning, mailbox);
				self.enter_once(MarkerKind::Blocked, mailbox, usage);
			}
		}
	}

	fn enter_once(&self, kind: MarkerKind, mailbox: &Address, usage: &Usage) {
		if self.markers.is_set(kind, mailbox) {
			return;
		}

		info!("{} - sending {} notice", mailbox, kind.dirname());
		if let Err(err) = self.mailer.send(&self.compose(kind, mailbox, usage)) {
			error!("{} - could not send {} notice: {}", mailbox, kind.dirname(), err);
		}

		// One send attempt per entry into a state, not one per check:
		// the marker is set whether or not the transport cooperated
		if let Err(err) = self.markers.enter(kind, mailbox) {
			error!("{} - could not set {} marker: {}", mailbox, kind.dirname(), err);
		}
	}

	fn clear(&self, kind: MarkerKind, mailbox: &Address) {
		if let Err(err) = self.markers.leave(kind, mailbox) {
			warn!("{} - could not clear {} marker: {}", mailbox, kind.dirname(), err);
		}
	}

	fn compose(&self, kind: MarkerKind, mailbox: &Address, usage: &Usage) -> Notice {
		let (subject, template) = match kind {
			MarkerKind::Warning => (&self.settings.warning_subject, WARNING_BODY),
			MarkerKind::Blocked => (&self.settings.blocked_subject, BLOCKED_BODY),
		};

		let body = template
			.replace("%email%", &mailbox.to_string())
			.replace("%used%", &format_gb(usage.bytes_used))
			.replace("%limit%", &format_gb(usage.limit));

		Notice {
			to: mailbox.to_string(),
			from: self.settings.from.clone(),
			subject: subject.clone(),
			body,
		}
	}
}
