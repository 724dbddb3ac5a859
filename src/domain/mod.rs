pub mod backup;
pub mod gpo;
pub mod version;

pub use backup::*;
pub use gpo::*;
pub use version::*;
