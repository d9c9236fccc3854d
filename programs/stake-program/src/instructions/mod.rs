// Export all instruction modules

pub mod initialize;
pub mod stake;
pub mod unstake;

// Re-export the instruction structs for easy access
pub use initialize::*;
pub use stake::*;
pub use unstake::*;
