// Library exports for the mailtriage crate
// This allows tests and other crates to use the modules

pub mod classifier;
pub mod config;
pub mod error;
pub mod gmail_client;
pub mod mailbox;
pub mod normalizer;
pub mod oracle;
pub mod triage;
