pub mod artifact;
pub mod config;
pub mod logging;
pub mod output;
