pub mod aero;
pub mod analyzer;
pub mod compensation;
pub mod competition;
pub mod hill_profile;
pub mod judges;
pub mod jump_loop;
pub mod landing;
pub mod physics;
pub mod scoring;
pub mod timing;

pub use analyzer::{analyze, FlightMetrics};
pub use competition::*;
pub use hill_profile::HillProfile;
pub use jump_loop::*;
pub use physics::JumpState;
