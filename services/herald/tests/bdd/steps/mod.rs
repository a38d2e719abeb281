//! BDD step definitions for herald service

pub mod delivery_steps;
pub mod dispatch_steps;
pub mod render_steps;
