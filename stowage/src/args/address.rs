use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use thiserror::Error;

use super::Validator;

/// The part of an address left of the `@`, canonical lowercase.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct LocalPart(String);

impl LocalPart {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for LocalPart {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for LocalPart {
	type Err = InvalidLocalPart;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if Validator::validate_local_part(s) {
			Ok(Self(s.to_ascii_lowercase()))
		} else {
			Err(InvalidLocalPart::InvalidSyntax)
		}
	}
}

#[derive(Error, Debug)]
pub enum InvalidLocalPart {
	#[error("invalid local part syntax")]
	InvalidSyntax,
}

/// A mail domain, canonical lowercase.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Domain(String);

impl Domain {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for Domain {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for Domain {
	type Err = ParseDomainError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if Validator::validate_domain(s) {
			Ok(Self(s.to_ascii_lowercase()))
		} else {
			Err(ParseDomainError::InvalidDomain)
		}
	}
}

#[derive(Error, Debug)]
pub enum ParseDomainError {
	#[error("invalid domain name")]
	InvalidDomain,
}

/// One quota-checked mailbox, `local-part@domain`.
///
/// Both parts are case-insensitive: parsing lowercases them, so two
/// spellings of the same mailbox compare equal, key the same cache slot
/// and resolve the same directory.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Address {
	pub local_part: LocalPart,
	pub domain: Domain,
}

impl Display for Address {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}@{}", self.local_part, self.domain)
	}
}

impl FromStr for Address {
	type Err = ParseAddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Some((local_part, domain)) = s.rsplit_once('@') {
			Ok(Self {
				local_part: local_part.parse()?,
				domain: domain.parse()?,
			})
		} else {
			Err(ParseAddressError::NoAtSign)
		}
	}
}

#[derive(Error, Debug)]
pub enum ParseAddressError {
	#[error("no @ separating local part and domain")]
	NoAtSign,
	#[error("invalid local part")]
	InvalidLocalPart(#[from] InvalidLocalPart),
	#[error("invalid domain")]
	InvalidDomain(#[from] ParseDomainError),
}
