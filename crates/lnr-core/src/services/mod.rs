pub mod cycles;
pub mod issues;
