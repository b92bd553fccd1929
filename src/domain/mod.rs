// Domain layer: entities, lending rules and ports. Nothing here performs I/O.

pub mod model;
pub mod policy;
pub mod ports;
