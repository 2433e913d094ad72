use std::{path::PathBuf, str::FromStr};

use thiserror::Error;

use crate::args::Address;

/// Where a mailbox keeps its mail on disk, as a path template with
/// `%local_part%` and `%domain%` placeholders.
///
/// Substitution is always lowercase because addresses canonicalize to
/// lowercase when they parse.
#[derive(Clone, Debug, PartialEq)]
pub struct MailboxTemplate {
	tokens: Vec<Token>,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
	Text(String),
	LocalPart,
	Domain,
}

impl MailboxTemplate {
	pub fn as_path(&self, address: &Address) -> PathBuf {
		PathBuf::from(
			self.tokens
				.iter()
				.map(|token| match token {
					Token::Text(text) => text.as_str(),
					Token::LocalPart => address.local_part.as_str(),
					Token::Domain => address.domain.as_str(),
				})
				.collect::<String>(),
		)
	}
}

impl FromStr for MailboxTemplate {
	type Err = ParseTemplateError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut tokens = vec![];

		let mut curr = s;
		loop {
			match curr.split_once('%') {
				None => {
					if !curr.is_empty() {
						tokens.push(Token::Text(curr.into()));
					}
					break;
				}
				Some((text, rest)) => {
					if !text.is_empty() {
						tokens.push(Token::Text(text.into()));
					}

					match rest.split_once('%') {
						None => return Err(ParseTemplateError::UnclosedVariable),
						Some((variable, rest)) => {
							curr = rest;
							tokens.push(match variable {
								"local_part" => Token::LocalPart,
								"domain" => Token::Domain,
								other => {
									return Err(ParseTemplateError::UnrecognizedVariable(
										other.into(),
									))
								}
							});
						}
					}
				}
			}
		}

		Ok(Self { tokens })
	}
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseTemplateError {
	#[error("hit the end of the template with a variable still open")]
	UnclosedVariable,
	#[error("'{0}' is not a recognized variable")]
	UnrecognizedVariable(String),
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn template_parse() {
		let template = MailboxTemplate::from_str("/var/vmail/%domain%/%local_part%/").unwrap();

		assert_eq!(
			template,
			MailboxTemplate {
				tokens: vec![
					Token::Text(String::from("/var/vmail/")),
					Token::Domain,
					Token::Text(String::from("/")),
					Token::LocalPart,
					Token::Text(String::from("/")),
				]
			}
		)
	}

	#[test]
	fn template_as_path() {
		let template: MailboxTemplate = "/var/vmail/%domain%/%local_part%/".parse().unwrap();

		assert_eq!(
			template.as_path(&"Alice@Example.COM".parse().unwrap()),
			PathBuf::from("/var/vmail/example.com/alice/")
		)
	}

	#[test]
	fn unclosed_variable() {
		assert_eq!(
			MailboxTemplate::from_str("/var/vmail/%domain"),
			Err(ParseTemplateError::UnclosedVariable)
		)
	}

	#[test]
	fn unknown_variable() {
		assert_eq!(
			MailboxTemplate::from_str("/var/vmail/%hostname%/"),
			Err(ParseTemplateError::UnrecognizedVariable(String::from(
				"hostname"
			)))
		)
	}

	#[test]
	fn plain_text_template() {
		let template: MailboxTemplate = "/srv/one-big-mailbox".parse().unwrap();

		assert_eq!(
			template.as_path(&"alice@example.com".parse().unwrap()),
			PathBuf::from("/srv/one-big-mailbox")
		)
	}
}
