// Domain layer: contact models and ports. No HTTP or file system details here.

pub mod model;
pub mod ports;
