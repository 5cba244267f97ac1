// Core algorithm exports
pub mod distance;
pub mod pipeline;

pub use distance::{haversine_distance, calculate_distance, distance_between, round_to_cents};
pub use pipeline::{QueryPipeline, PipelineError, PipelineOutcome, Stage};
