pub mod rcon;
