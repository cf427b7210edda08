pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod flows;
pub mod graphql;
pub mod http;
pub mod workflow;
