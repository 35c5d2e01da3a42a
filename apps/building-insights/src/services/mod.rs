pub mod analysis;
pub mod document;
pub mod facts;
pub mod generator;
pub mod report;
pub mod store;
