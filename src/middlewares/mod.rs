pub mod cors;
pub mod recover;

pub use cors::create_cors;
pub use recover::RecoverPanic;
