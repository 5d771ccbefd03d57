// Audio module - CPAL output and real-time sample utilities

pub mod dsp_utils;
pub mod engine;
pub mod format_conversion;
pub mod parameters;
