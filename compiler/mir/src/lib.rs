pub use print_tacky::*;
pub use sem_err::*;
pub use tacky_gen::*;

pub mod const_fold;
pub mod print_tacky;
pub mod sem_err;
pub mod tacky;
pub mod tacky_gen;
