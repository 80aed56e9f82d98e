pub mod generate;

pub use generate::{noise_input, scenario_design, scenario_table, uncompensated_table};
