// Domain layer: patient and assessment models plus the ports the engine depends on.

pub mod model;
pub mod ports;
