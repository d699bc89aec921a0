//! HTTP handlers for the document preview server.

mod document;
mod health;
mod router;


pub use router::create_router;
