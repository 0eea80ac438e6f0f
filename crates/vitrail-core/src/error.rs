use thiserror::Error;
use web_time::Duration;

#[derive(Debug, Clone, Error)]
pub enum RasterError {
    #[error("rasterizer failed: {0}")]
    Render(String),
    #[error("rasterization timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Error)]
pub enum StackError {
    /// Pushing past the configured depth is rejected, never silently dropped.
    #[error("page stack at capacity ({depth}/{capacity})")]
    CapacityExceeded { depth: usize, capacity: usize },
}

#[derive(Debug, Clone, Error)]
pub enum AtlasError {
    /// More layers visible than texture slots. The first `max` layers in
    /// declaration order stay mapped; the rest are rejected for the frame.
    #[error("{visible} layers visible but only {max} texture slots")]
    CapacityExceeded { visible: usize, max: usize },
}
