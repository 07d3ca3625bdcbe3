pub mod clock;
pub mod day_range;
pub mod db;
pub mod error;
pub mod estimator;
pub mod models;
pub mod openai;
pub mod service;

pub use error::{Error, Result};
