pub mod pii;
pub mod render;

pub use pii::Masked;
