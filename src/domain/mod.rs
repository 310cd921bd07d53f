// Domain layer: receipt models and ports (interfaces) for storage and mail delivery.

pub mod model;
pub mod ports;
