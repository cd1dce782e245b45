pub mod market;
pub mod quote;
pub mod trading;
pub mod user;

pub use market::*;
pub use quote::*;
pub use trading::*;
pub use user::*;
