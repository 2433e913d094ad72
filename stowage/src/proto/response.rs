/// Every byte sequence the daemon ever writes back.
///
/// The two verdicts are bare bytes with no trailing newline; the MTA
/// reads the response as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
	Accept,
	Block,
	Pong,
	Unknown,
}

impl Response {
	pub fn as_bytes(self) -> &'static [u8] {
		match self {
			Self::Accept => b"0",
			Self::Block => b"1",
			Self::Pong => b"pong!\n",
			Self::Unknown => b"Unknown command\n",
		}
	}
}
