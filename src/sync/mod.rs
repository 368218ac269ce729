mod barrier;
mod credits;

pub use barrier::CreditBarrier;
pub use credits::Credits;
