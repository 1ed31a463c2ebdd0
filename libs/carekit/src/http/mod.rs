pub mod client;

pub use client::{TracedClient, REQUEST_ID_HEADER};
