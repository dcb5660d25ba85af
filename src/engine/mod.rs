pub mod compliance;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod types;
