pub mod baseline;

pub use baseline::{Baseline, BaselineRecord, BaselineStore};
