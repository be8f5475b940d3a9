pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod model;
pub mod models;
pub mod routes;
pub mod services;
