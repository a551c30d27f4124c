pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod query;
pub mod seed;
pub mod state;
pub mod uploads;
