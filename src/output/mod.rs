//! Report output: fixed-width text lines and the JSON report

pub mod json;
pub mod text;
