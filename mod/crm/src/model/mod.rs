mod customer;
mod segment;

pub use customer::*;
pub use segment::*;
