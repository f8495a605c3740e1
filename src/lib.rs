pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod observability;
pub mod reference;
pub mod repositories;
pub mod services;
pub mod webhook;
