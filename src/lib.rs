//! Clearwater Intelligence Desk — RAG intake backend.
//!
//! Turns a prospective client's free-text legal scenario into up to two
//! clarifying questions (`mode=drill`) and a streamed, citation-grounded
//! preliminary analysis (`mode=analyze`), backed by a pgvector precedent
//! store and a hosted LLM.

pub mod api;
pub mod app;
pub mod db;
pub mod flow;
pub mod model;
pub mod provider;
pub mod service;
