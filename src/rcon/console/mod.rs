//! Remote console boundary.
//!
//! - `traits`: the `RemoteConsole` seam the router depends on
//! - `client`: `RconClient`, the production implementation over the `rcon` crate

mod client;
mod traits;

pub use client::RconClient;
pub use traits::RemoteConsole;
