pub mod api;
pub mod models;

pub use models::{Annotation, Image, ImageDetail, ReviewStatus, TransitionOutcome, Version};
