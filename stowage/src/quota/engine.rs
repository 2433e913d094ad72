use std::{io, path::PathBuf, sync::Arc};

use regex::Regex;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::args::Address;

use super::{
	cache::TtlCache,
	limits::LimitTable,
	notify::{format_gb, MailSettings, Mailer, MarkerStore, Notifier},
	template::MailboxTemplate,
	walker::{self, Walk, WalkError},
};

/// How a mailbox's usage compares to its limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
	Good,
	Warning,
	Blocked,
}

/// One complete measurement of a mailbox, as frozen into the cache.
#[derive(Clone, Debug)]
pub struct Usage {
	pub bytes_used: u64,
	pub limit: u64,
	pub classification: Classification,
}

/// What goes back over the wire for a check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
	Accept,
	Block,
}

/// Everything the engine needs to know, resolved by the daemon's config.
pub struct EngineConfig {
	pub maildir: MailboxTemplate,
	pub limits: LimitTable,
	pub state_dir: PathBuf,
	pub cache_ttl: Duration,
	pub warn_ratio: f64,
	pub whitelist: Option<Regex>,
	pub mail: MailSettings,
}

/// The quota checker: resolves, walks, caches, classifies and notifies.
///
/// One instance is shared by every connection task; the cache inside it
/// is the only cross-connection state.
pub struct QuotaEngine {
	maildir: MailboxTemplate,
	limits: LimitTable,
	cache: TtlCache<Usage>,
	notifier: Notifier,
	warn_ratio: f64,
	whitelist: Option<Regex>,
}

impl QuotaEngine {
	/// Build the engine and create its marker directories.
	pub fn new(config: EngineConfig, mailer: Arc<dyn Mailer>) -> io::Result<Self> {
		let markers = MarkerStore::new(&config.state_dir);
		markers.create_directories()?;

		Ok(Self {
			maildir: config.maildir,
			limits: config.limits,
			cache: TtlCache::new(config.cache_ttl),
			notifier: Notifier::new(markers, mailer, config.mail),
			warn_ratio: config.warn_ratio,
			whitelist: config.whitelist,
		})
	}

	/// Answer one check_quota command.
	pub async fn check(&self, mailbox: &Address, sender: Option<&str>) -> Verdict {
		if let (Some(whitelist), Some(sender)) = (&self.whitelist, sender) {
			if whitelist.is_match(sender) {
				info!("{} - whitelisted sender {}", mailbox, sender);
				return Verdict::Accept;
			}
		}

		info!("{} - checking quota", mailbox);
		let usage = self
			.cache
			.get_or_compute(&mailbox.to_string(), || self.recheck(mailbox))
			.await;

		match usage.classification {
			Classification::Blocked => {
				info!("{} - result: QUOTA-EXCEEDED", mailbox);
				Verdict::Block
			}
			_ => {
				info!("{} - result: GOOD", mailbox);
				Verdict::Accept
			}
		}
	}

	// Runs under the cache's per-mailbox lock: at most one of these is
	// in flight per mailbox, and the marker transition below is
	// serialized with it.
	async fn recheck(&self, mailbox: &Address) -> Usage {
		info!("{} - recalculating", mailbox);

		let limits = self.limits.clone();
		let domain = mailbox.domain.clone();
		let directory = self.maildir.as_path(mailbox);
		let label = mailbox.to_string();

		let walked = tokio::task::spawn_blocking(move || {
			let limit = limits.limit_for(&domain);
			info!("{} - limit for {} is {}", label, domain, format_gb(limit));
			info!("{} - directory is {}", label, directory.display());

			(limit, walker::walk(&directory, limit))
		})
		.await;

		let usage = match walked {
			Ok((limit, outcome)) => self.classify(mailbox, limit, outcome),
			Err(err) => {
				warn!("{} - size walk died ({}), accepting", mailbox, err);
				Usage {
					bytes_used: 0,
					limit: self.limits.default_limit(),
					classification: Classification::Good,
				}
			}
		};

		let notifier = self.notifier.clone();
		let observed_mailbox = mailbox.clone();
		let observed_usage = usage.clone();
		let notified = tokio::task::spawn_blocking(move || {
			notifier.observe(&observed_mailbox, &observed_usage)
		})
		.await;

		if let Err(err) = notified {
			warn!("{} - notification task died: {}", mailbox, err);
		}

		usage
	}

	fn classify(&self, mailbox: &Address, limit: u64, outcome: Result<Walk, WalkError>) -> Usage {
		match outcome {
			Ok(Walk::Complete(bytes_used)) => {
				info!(
					"{} - using {} of {}",
					mailbox,
					format_gb(bytes_used),
					format_gb(limit)
				);

				let classification = if bytes_used as f64 > self.warn_ratio * limit as f64 {
					Classification::Warning
				} else {
					Classification::Good
				};

				Usage {
					bytes_used,
					limit,
					classification,
				}
			}
			Ok(Walk::StoppedEarly(partial)) => {
				info!(
					"{} - stopped counting at {}, over the {} limit",
					mailbox,
					format_gb(partial),
					format_gb(limit)
				);

				Usage {
					bytes_used: partial.min(limit),
					limit,
					classification: Classification::Blocked,
				}
			}
			Err(err) => {
				// Indeterminate is not the same as over quota: fail open
				warn!("{} - {}, accepting", mailbox, err);

				Usage {
					bytes_used: 0,
					limit,
					classification: Classification::Good,
				}
			}
		}
	}
}
