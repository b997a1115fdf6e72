pub mod browser;
pub mod checksum;
pub mod classify;
pub mod cli;
pub mod config;
pub mod controller;
pub mod report;
pub mod scan;
pub mod store;
