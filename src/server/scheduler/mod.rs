//! Cron jobs.

pub mod config_refresh;
