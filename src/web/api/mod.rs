pub mod error;
pub mod navigation;
pub mod position;
