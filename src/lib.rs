//! Sobremesa: the data-access core of a blog management console backed by a
//! schema-less document store.
//!
//! The crate keeps a derived key→id index consistent with a remote, mutable
//! store and composes multi-way joins (author, categories, tags, comments)
//! into denormalized article views without a relational query planner. UI
//! construction and the raw wire driver live outside this crate; callers
//! consume the [`application::context::Console`] context object.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
