//! Catalog records and list parameters.
//!
//! These are the wire shapes exchanged with the catalog API. The cache layer
//! never interprets entity fields other than identifiers.

mod entities;
mod pagination;

pub use entities::{
    Author, AuthorDraft, AuthorPatch, Book, BookDraft, BookPatch, Category, CategoryDraft,
    CategoryPatch, Health,
};
pub use pagination::{ListParams, Page};
