pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod middleware;
pub mod receiver;
pub mod routes;
pub mod signature;
