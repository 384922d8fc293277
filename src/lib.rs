//! A stand-in for a virtual try-on (VTON) model server. It speaks the same
//! HTTP protocol as the real thing but answers every request with a drawn
//! placeholder, so clients can be tested without a GPU.

pub mod config;
pub mod render;
pub mod server;
pub mod source;
