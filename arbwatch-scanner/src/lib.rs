pub mod config;
pub mod data;
pub mod display;
pub mod spread_scanner;
