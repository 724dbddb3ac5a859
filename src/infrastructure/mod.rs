pub mod directory;
pub mod manifest;
pub mod powershell;
pub mod sysvol;

pub use directory::*;
pub use manifest::*;
pub use powershell::*;
pub use sysvol::*;
