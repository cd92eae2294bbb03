pub mod commands;
pub mod common;
pub mod configs;
pub mod error;
pub mod mail;
pub mod qinglong;
pub mod sources;
