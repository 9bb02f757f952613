pub mod variant;
pub use variant::*;
