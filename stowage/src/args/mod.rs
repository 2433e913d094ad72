mod address;
mod validator;

pub use address::*;
pub use validator::*;

#[cfg(test)]
mod test {
	use std::str::FromStr;

	use super::*;

	fn valid_domains() -> Vec<String> {
		let mut valid = vec![];
		let should_pass = ["domain", "0domain", "domain0", "0-domain", "domain-0"];

		// These should all pass on their own
		for name in should_pass {
			valid.push(name.to_string());
		}

		// ... as well as when joined with a dot
		for name in should_pass {
			for name2 in should_pass {
				valid.push(format!("{}.{}", name, name2));
			}
		}

		valid
	}

	fn invalid_domains() -> Vec<String> {
		let mut invalid = vec![String::new()];

		for domain in valid_domains() {
			// No leading/trailing dots or hyphens
			invalid.push(format!(".{}", domain));
			invalid.push(format!("{}.", domain));
			invalid.push(format!("-{}", domain));
			invalid.push(format!("{}-", domain));
		}

		invalid
	}

	fn valid_localparts() -> Vec<String> {
		vec![
			String::from("user"),
			String::from("user24234"),
			String::from("user.user"),
			String::from("user23423.user"),
			String::from("user.user.user"),
			String::from("user+tag"),
			String::from("user_name"),
			String::from("user-name"),
		]
	}

	fn invalid_localparts() -> Vec<String> {
		vec![
			String::from(""),
			String::from(".user"),     //leading dot
			String::from("user."),     //trailing dot
			String::from("user..er"),  //double dot
			String::from("user user"), //space
			String::from("us@er"),     //@ inside
			String::from("us/er"),     //a path separator is never an address
			String::from("\"user\""),  //no quoted strings here
		]
	}

	#[test]
	fn domain_pass() {
		for domain in valid_domains() {
			assert!(Domain::from_str(&domain).is_ok(), "failed on {}", domain)
		}
	}

	#[test]
	fn domain_fail() {
		for domain in invalid_domains() {
			assert!(Domain::from_str(&domain).is_err(), "passed on {}", domain)
		}
	}

	#[test]
	fn address_pass() {
		for domain in valid_domains() {
			for local in valid_localparts() {
				let address = format!("{}@{}", local, domain);
				assert!(Address::from_str(&address).is_ok(), "failed on {}", address)
			}
		}
	}

	#[test]
	fn address_fail() {
		let valid_domains = valid_domains();
		let valid_locals = valid_localparts();

		// Should fail if the local is bad but the domain good
		for domain in &valid_domains {
			for local in invalid_localparts() {
				let address = format!("{}@{}", local, domain);
				assert!(Address::from_str(&address).is_err(), "passed on {}", address)
			}
		}

		// ... and if the domain is bad but the local good
		for domain in invalid_domains() {
			for local in &valid_locals {
				let address = format!("{}@{}", local, domain);
				assert!(Address::from_str(&address).is_err(), "passed on {}", address)
			}
		}
	}

	#[test]
	fn address_needs_at_sign() {
		assert!(matches!(
			Address::from_str("no-at-sign"),
			Err(ParseAddressError::NoAtSign)
		));
	}

	#[test]
	fn address_lowercases() {
		let upper: Address = "Alice@Example.COM".parse().unwrap();
		let lower: Address = "alice@example.com".parse().unwrap();

		assert_eq!(upper, lower);
		assert_eq!(upper.to_string(), "alice@example.com");
	}

	#[test]
	fn rightmost_at_splits() {
		// '@' is not valid in our local parts, so an address with two of
		// them never parses, whichever side the extra lands on
		assert!(Address::from_str("a@b@example.com").is_err());
	}
}
