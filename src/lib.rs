pub mod config;
pub mod db;
pub mod perfdata;

/// Application name for platform config and data paths
pub const APP_NAME: &str = "enginelib";
