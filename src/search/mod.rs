pub mod classifier;
pub mod similarity;
