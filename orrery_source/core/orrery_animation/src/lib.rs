mod interpolator;

pub use interpolator::Interpolator;
