pub mod assistant;
pub mod config;
pub mod error;
pub mod filter;
pub mod gemini;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod session;
pub mod state;
pub mod summary;
pub mod transport;
