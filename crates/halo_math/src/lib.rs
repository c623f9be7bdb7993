// Re-export glam for convenience
pub use glam::*;

// Halo math types
mod frame;
mod ray;
mod rng;
pub use frame::tangent_frame;
pub use ray::Ray;
pub use rng::HashRng;
