mod noise;

pub use noise::{add_white_noise, signal_power, white_noise};
