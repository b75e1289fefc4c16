/*
 * Responsibility
 * - v1 の公開面 (routes() の re-export など)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod openapi;
mod routes;

pub use routes::{actuator_routes, routes};
