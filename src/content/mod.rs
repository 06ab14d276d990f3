//! Content module - microCMS models, query descriptors and the read facade

pub mod api;
mod post;
mod query;

pub use api::{ClientConfig, ContentApi};
pub use post::{Category, Eyecatch, ListResult, Post, Reference, Tag};
pub use query::{QueryError, QueryValue, Queries};
