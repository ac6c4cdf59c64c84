pub use emission::*;

pub mod emission;
