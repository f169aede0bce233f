//! Order Service - Order lifecycle management as a microservice.
//!
//! Accepts order requests over HTTP, prices them against the catalog
//! service, persists them in PostgreSQL, and settles them asynchronously
//! from payment-result events.

pub mod config;
pub mod dtos;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod workers;
