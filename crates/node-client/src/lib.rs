#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! HTTP adapter for the node command API used by `wallet-inputs`.

mod client;
pub mod commands;
mod error;

pub use client::{API_VERSION, API_VERSION_HEADER, DEFAULT_REQUEST_TIMEOUT, HttpNodeClient};
pub use error::NodeClientError;
