//! Data models shared by the engines.

pub mod config;
pub mod document;
pub mod invoice;
