pub mod artifacts;
pub mod config;
pub mod health;
pub mod insights;
pub mod memory_service;
pub mod plans;
pub mod usage;
