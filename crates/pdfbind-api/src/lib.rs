//! Pdfbind merge service.
//!
//! A stateless HTTP service with two operations: issue upload grants for
//! direct-to-storage uploads (`POST /upload`) and merge previously uploaded
//! documents into one downloadable PDF (`POST /merge`).

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
