//! Domain types shared by the symbol-art client crates.

pub mod error;
pub mod image_info;
pub mod settings;
pub mod source;
