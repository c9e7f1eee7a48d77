pub mod amount;
pub mod analytics;
pub mod chain;
pub mod config;
pub mod entity;
pub mod events;
pub mod notifier;
pub mod query;
pub mod repository;
pub mod rpc;
pub mod scanner;
