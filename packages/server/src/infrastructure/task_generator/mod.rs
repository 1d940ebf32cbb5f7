//! Task generator implementations.

pub mod random;

pub use random::RandomTaskGenerator;
