pub mod product;

pub use product::{Product, ProductPatch, ProductUpdate, UpdateField, UPDATE_FIELD_HEADER};
