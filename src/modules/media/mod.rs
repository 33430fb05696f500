pub mod comparison;
pub mod model;
pub mod probe;
