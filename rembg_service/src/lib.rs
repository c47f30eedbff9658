mod model_kind;
mod ort_service;
mod routes;
mod server;
mod state;

pub mod config;
pub mod model_service;

#[cfg(test)]
mod mocks;

pub use model_kind::{ModelKind, SUPPORTED_MODELS};
pub use routes::{INPUT_SIZE_HEADER, OUTPUT_SIZE_HEADER, PROCESSING_TIME_HEADER};
pub use server::start_server;
