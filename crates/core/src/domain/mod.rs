pub mod queue;
pub mod stock;
pub mod symbol;
