pub mod client;

pub use client::{InstaClient, DEFAULT_API_BASE};
