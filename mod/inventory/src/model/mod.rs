mod product;
mod stock;
mod supplier;

pub use product::*;
pub use stock::*;
pub use supplier::*;
