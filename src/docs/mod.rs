pub mod api;
pub mod auth;
#[cfg(test)]
pub mod memory;
pub mod model;
pub mod writer;

use crate::error::Result;
use model::{Paragraph, Request};

/// A structured document that can be read as paragraphs and mutated in batches.
///
/// `batch_update` must apply all requests or none of them.
pub trait DocumentStore {
    fn fetch_paragraphs(&mut self) -> Result<Vec<Paragraph>>;
    fn batch_update(&mut self, requests: &[Request]) -> Result<()>;
}
