pub mod certificates;
pub mod generator;
