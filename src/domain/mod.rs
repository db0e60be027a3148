// Domain layer: record types, classification tiers and ports to the outside world.

pub mod certificate;
pub mod model;
pub mod ports;
