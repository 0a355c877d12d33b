pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod extract;
pub mod info;
pub mod output;
pub mod runtime;

pub use app::run;
