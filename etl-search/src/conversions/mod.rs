//! Conversions from replicated rows to index documents.

pub mod document;
pub mod hex;
