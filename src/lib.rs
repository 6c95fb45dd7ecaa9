pub mod app;
pub mod authors;
pub mod config;
pub mod credentials;
pub mod state;
