pub mod api;
pub mod api_connection;
pub mod cli;
pub mod config;
pub mod llm;
pub mod logging;
pub mod recipes;
pub mod storage;
pub mod users;
