//! Kafka wire protocol codec with a cluster topology model and client timeout policy.
//!
//! Decoders work on complete, already received buffers. Connecting to brokers, retries and compression codecs are
//! left to the caller.
#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    rust_2018_idioms,
    unsafe_code
)]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]
pub mod config;
pub mod metadata;
pub mod protocol;
pub mod topology;

pub type ProtocolError = protocol::error::Error;
