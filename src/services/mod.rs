pub mod candidates;
pub mod inference;
pub mod ranking;
pub mod recommendations;
pub mod title_search;

pub use inference::{InferenceAdapter, Predictor};
pub use recommendations::Recommender;
