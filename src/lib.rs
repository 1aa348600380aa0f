pub mod app;
pub mod config;
pub mod feeds;
pub mod resolver;
pub mod storage;
pub mod topics;
pub mod ui;
