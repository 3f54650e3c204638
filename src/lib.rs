//! Library crate for reconhub: the simulated subdomain scanner and its embedded web UI.
pub mod export;
pub mod history;
pub mod pages;
pub mod scanner;
pub mod server;
pub mod types;
