mod cache;
mod engine;
mod limits;
mod notify;
mod template;
mod walker;

pub use cache::TtlCache;
pub use engine::{Classification, EngineConfig, QuotaEngine, Usage, Verdict};
pub use limits::LimitTable;
pub use notify::{
	format_gb, MailError, MailSettings, Mailer, MarkerKind, MarkerStore, Notice, Notifier,
};
pub use template::{MailboxTemplate, ParseTemplateError};
pub use walker::{walk, Walk, WalkError};
