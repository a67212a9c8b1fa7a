// Domain layer: entity models, form view-models and ports (interfaces) to the outside world.

pub mod forms;
pub mod model;
pub mod ports;
