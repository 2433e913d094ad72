use std::{
	io::Write,
	process::{Command, Stdio},
};

use stowage::quota::{MailError, Mailer, Notice};
use tracing::debug;

// Any sendmail-compatible mail(1) works here
const MAIL_COMMAND: &str = "mail";

/// Delivers notices through the system `mail` command, body on stdin.
pub struct SendmailMailer;

impl Mailer for SendmailMailer {
	fn send(&self, notice: &Notice) -> Result<(), MailError> {
		debug!("spawning {} for {}", MAIL_COMMAND, notice.to);

		let mut child = Command::new(MAIL_COMMAND)
			.arg("-s")
			.arg(&notice.subject)
			.arg("-a")
			.arg(format!("from: {}", notice.from))
			.arg(&notice.to)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()?;

		if let Some(mut stdin) = child.stdin.take() {
			stdin.write_all(notice.body.as_bytes())?;
		}

		let status = child.wait()?;
		if status.success() {
			Ok(())
		} else {
			Err(MailError::Failed(status))
		}
	}
}
