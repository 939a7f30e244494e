pub mod config;
pub mod http;
pub mod media;
pub mod process;
pub mod repositories;
pub mod storage;
