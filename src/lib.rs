pub mod config;
pub mod controller;
pub mod dom;
pub mod init;
pub mod orchestrator;
pub mod rules;
pub mod scheduler;
pub mod store;
