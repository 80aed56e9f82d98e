mod coefficients;
mod remez;

pub use coefficients::CoefficientVector;
pub use remez::design;
