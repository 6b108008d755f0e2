//! Event-to-price correlation.
//!
//! Pins each external event onto the price sample nearest to it in time,
//! producing a chart-ready series.

pub mod chart;
pub mod correlator;

pub use chart::{ChartRequest, load_chart};
pub use correlator::{
    AugmentedSample, Correlation, CorrelatorConfig, DEFAULT_CUTOFF_SECS, correlate,
    nearest_sample_index,
};
