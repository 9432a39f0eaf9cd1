//! Products

pub mod data;
pub mod errors;
pub mod pricing;
pub mod records;
pub(crate) mod repository;
pub mod service;
pub mod visibility;

pub use errors::ProductsServiceError;
pub use service::*;
pub use visibility::{Visibility, apply_visibility_filter};
