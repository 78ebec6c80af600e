pub mod api;
pub mod cache;
pub mod config;
pub mod o11y;
pub mod providers;
pub mod routes;
pub mod services;
pub mod titles;
