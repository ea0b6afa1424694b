mod annotator;
mod client;
mod render;

pub use annotator::{Annotator, EntityAnnotator};
#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::MockNerClient;
pub use client::{HttpNerClient, NerClient, NerDoc, NerEntity, NerToken};
pub use render::render_entities;
