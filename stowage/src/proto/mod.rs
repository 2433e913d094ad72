mod command;
mod response;
mod server;

pub use command::{Command, ParseCommandError};
pub use response::Response;
pub use server::listen;
