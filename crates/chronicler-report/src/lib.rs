pub mod forge;
pub mod tracker;
