//! cf-support - Kubernetes support data collection for Codefresh runtimes

pub mod catalog;
pub mod cli;
pub mod client;
pub mod cluster;
pub mod collector;
pub mod commands;
pub mod config;
pub mod error;
pub mod limiter;
pub mod output;
pub mod package;
pub mod platform;
pub mod processor;
pub mod writer;
