pub mod config;
pub mod consumer;
pub mod decoder;
pub mod http;
pub mod session;
pub mod state;
pub mod transport;
