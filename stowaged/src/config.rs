use std::{
	net::{IpAddr, SocketAddr},
	path::PathBuf,
	time::Duration,
};

use confindent::Confindent;
use getopts::Options;
use regex::Regex;
use stowage::quota::{EngineConfig, LimitTable, MailSettings, MailboxTemplate};

const MEGABYTE: u64 = 1_000_000;

pub struct Config {
	pub address: IpAddr,
	pub port: u16,
	pub debug: bool,
	pub log: PathBuf,
	pub engine: EngineConfig,
}

#[allow(clippy::or_fun_call)]
impl Config {
	fn print_usage<S: AsRef<str>>(prgm: S, opts: &Options) {
		let brief = format!("Usage: {} [options]", prgm.as_ref());
		println!("{}", opts.usage(&brief));
	}

	pub fn socket_address(&self) -> SocketAddr {
		SocketAddr::new(self.address, self.port)
	}

	pub fn get() -> Option<Self> {
		let args: Vec<String> = std::env::args().collect();

		let mut opts = Options::new();
		opts.optflag("h", "help", "Print this help message");
		opts.optflag(
			"d",
			"debug",
			"Listen on the debug port and echo the log to stdout",
		);
		opts.optopt(
			"l",
			"listen-address",
			"The IP address to listen for quota checks on\nDefault: 127.0.0.1",
			"IP_ADDR",
		);
		opts.optopt(
			"p",
			"port",
			"The port to listen on\nDefault: 2626 (2627 with -d)",
			"PORT",
		);
		opts.optopt(
			"c",
			"config",
			"An alternate location to read the config from\nDefault: /etc/stowaged/stowaged.conf",
			"PATH",
		);

		let matches = match opts.parse(&args[1..]) {
			Ok(m) => m,
			Err(_e) => return None,
		};

		if matches.opt_present("help") {
			Self::print_usage(&args[0], &opts);
			return None;
		}

		let conf_path = matches
			.opt_str("config")
			.unwrap_or("/etc/stowaged/stowaged.conf".into());

		let config = match Confindent::from_file(conf_path) {
			Ok(c) => c,
			Err(_) => match Confindent::from_file("stowaged.conf") {
				Ok(c) => c,
				Err(err) => {
					eprintln!("failed to parse conf file: {}", err);
					return None;
				}
			},
		};

		// Options specified on the command line take priority. We only take the
		// cli_key and convert to the config key internally so that we can remain
		// consistent.
		let find_value = |cli_key: &str| -> Option<String> {
			let conf_key: String = cli_key
				.split('-')
				.map(|word| {
					// https://stackoverflow.com/a/38406885
					let mut c = word.chars();
					match c.next() {
						None => String::new(),
						Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
					}
				})
				.collect();

			matches
				.opt_str(cli_key)
				.or(config.child_value(conf_key).map(|s| s.into()))
		};

		let debug = matches.opt_present("debug");

		let address_string = find_value("listen-address").unwrap_or("127.0.0.1".into());
		let address = match address_string.parse() {
			Ok(addr) => addr,
			Err(_e) => {
				eprintln!("Failed to parse '{}' as an IP Address", address_string);
				return None;
			}
		};

		// -p wins either way, but plain -d flips to the debug port
		let port_string = if debug {
			matches
				.opt_str("port")
				.or(config.child_owned("DebugPort"))
				.unwrap_or("2627".into())
		} else {
			find_value("port").unwrap_or("2626".into())
		};
		let port = match port_string.parse() {
			Ok(p) => p,
			Err(_e) => {
				eprintln!("Failed to parse '{}' as a port", port_string);
				return None;
			}
		};

		let maildir: MailboxTemplate = match config.child_value("Maildir") {
			None => {
				eprintln!("'Maildir' not found in config. Where do the mailboxes live?");
				return None;
			}
			Some(raw) => match raw.parse() {
				Ok(template) => template,
				Err(err) => {
					eprintln!("Could not parse Maildir template: {}", err);
					return None;
				}
			},
		};

		let default_megabytes: u64 = match config
			.child_owned("DefaultQuota")
			.unwrap_or("5000".into())
			.parse()
		{
			Ok(mb) => mb,
			Err(_e) => {
				eprintln!("Failed to parse 'DefaultQuota' as megabytes");
				return None;
			}
		};

		let quota_file: PathBuf = config
			.child_owned("QuotaFile")
			.unwrap_or("/etc/stowaged/quota-per-domain".into())
			.into();

		let state_dir: PathBuf = config
			.child_owned("StateDir")
			.unwrap_or("/var/lib/stowaged".into())
			.into();

		let log = config
			.child_owned("Log")
			.map(PathBuf::from)
			.unwrap_or(state_dir.join("stowaged.log"));

		let cache_seconds: u64 = match config
			.child_owned("CacheSeconds")
			.unwrap_or("300".into())
			.parse()
		{
			Ok(secs) => secs,
			Err(_e) => {
				eprintln!("Failed to parse 'CacheSeconds' as seconds");
				return None;
			}
		};

		let warn_ratio: f64 = match config.child_owned("WarnRatio").unwrap_or("0.9".into()).parse()
		{
			Ok(ratio) => ratio,
			Err(_e) => {
				eprintln!("Failed to parse 'WarnRatio' as a ratio");
				return None;
			}
		};

		let whitelist = match config.child_value("WhitelistSender") {
			None => None,
			Some(pattern) => match Regex::new(pattern) {
				Ok(regex) => Some(regex),
				Err(err) => {
					eprintln!("'WhitelistSender' is not a usable pattern: {}", err);
					return None;
				}
			},
		};

		let mut mail = MailSettings::default();
		if let Some(section) = config.child("Mail") {
			if let Some(from) = section.child_value("From") {
				mail.from = from.into();
			}
			if let Some(subject) = section.child_value("WarningSubject") {
				mail.warning_subject = subject.into();
			}
			if let Some(subject) = section.child_value("BlockedSubject") {
				mail.blocked_subject = subject.into();
			}
		}

		Some(Self {
			address,
			port,
			debug,
			log,
			engine: EngineConfig {
				maildir,
				limits: LimitTable::new(quota_file, default_megabytes * MEGABYTE),
				state_dir,
				cache_ttl: Duration::from_secs(cache_seconds),
				warn_ratio,
				whitelist,
				mail,
			},
		})
	}
}
