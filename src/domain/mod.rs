// Domain layer: estimate models and ports (interfaces).

pub mod model;
pub mod ports;
