//! Trending topics: detection ([`analyzer`]) and trend-biased selection
//! ([`selector`]).

pub mod analyzer;
pub mod fallback;
pub mod selector;

pub use analyzer::{parse_analysis, TrendAnalyzer, TREND_FETCH_LIMIT};
pub use fallback::fallback_analysis;
pub use selector::{allocate, is_relevant, select, trend_keywords, Selection};
