use std::str::FromStr;

use thiserror::Error;

use crate::args::{Address, ParseAddressError};

/// One parsed request line.
#[derive(Clone, Debug)]
pub enum Command {
	/// `check_quota <email> [sender]`. Words after the sender are
	/// ignored.
	CheckQuota {
		mailbox: Address,
		sender: Option<String>,
	},
	Ping,
}

impl FromStr for Command {
	type Err = ParseCommandError;

	/// Expects the line already trimmed and lowercased.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut words = s.split_whitespace();

		match words.next() {
			Some("check_quota") => {
				let mailbox = match words.next() {
					Some(word) => word.parse()?,
					None => return Err(ParseCommandError::MissingMailbox),
				};

				Ok(Command::CheckQuota {
					mailbox,
					sender: words.next().map(String::from),
				})
			}
			Some("ping") => Ok(Command::Ping),
			_ => Err(ParseCommandError::UnknownCommand),
		}
	}
}

#[derive(Error, Debug)]
pub enum ParseCommandError {
	#[error("unknown command")]
	UnknownCommand,
	#[error("check_quota needs a mailbox")]
	MissingMailbox,
	#[error("bad mailbox: {0}")]
	BadMailbox(#[from] ParseAddressError),
}
