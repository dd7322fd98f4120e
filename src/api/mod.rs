// Line-delimited JSON API for editor integrations.

pub mod dto;
pub mod server;

pub use server::{start_server, Server, ServerState};
