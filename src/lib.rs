pub mod assets; // Data-buffer dependency resolution
pub mod bind; // Parameter <-> control synchronization
pub mod bootstrap;
pub mod device;
pub mod patch; // Patch bundle data model
pub mod presets;
pub mod runtime; // Versioned runtime provisioning

pub const MAX_BLOCK_SIZE: usize = 2048;
