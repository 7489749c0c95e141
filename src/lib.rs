pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod i18n;
pub mod models;
pub mod retry;
pub mod translation;
pub mod validation;
