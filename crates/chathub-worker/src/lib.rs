//! Scheduled maintenance tasks for ChatHub.
//!
//! This crate provides:
//! - A cron scheduler that runs periodic jobs in-process
//! - The message retention sweep that expires old chat messages

pub mod jobs;
pub mod scheduler;

pub use jobs::RetentionSweep;
pub use scheduler::CronScheduler;
