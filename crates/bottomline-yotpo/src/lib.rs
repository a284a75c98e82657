//! Client for the Yotpo bottomlines API.

pub mod client;
pub mod error;
pub mod normalize;
mod retry;
pub mod types;

pub use client::YotpoClient;
pub use error::ProviderError;
