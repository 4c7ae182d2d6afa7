pub mod config;
pub mod logging;

pub mod confirm;
pub mod error;
pub mod fetcher;
pub mod manifest;
pub mod progress;
pub mod response;
pub mod runner;
pub mod storage;
pub mod url_model;
