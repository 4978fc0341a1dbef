pub mod filter;
pub mod plan;
pub mod saved;
pub mod trip;
