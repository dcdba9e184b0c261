//! State module for tracking crawl position
//!
//! # Components
//!
//! - `CrawlWatermark`: The id of the newest incident already seen
//! - `StartPosition`: Where to begin when no watermark has been persisted

mod start_position;
mod watermark;

// Re-export main types
pub use start_position::StartPosition;
pub use watermark::CrawlWatermark;
