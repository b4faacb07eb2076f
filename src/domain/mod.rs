pub mod rows;
pub mod time;

pub use rows::*;
pub use time::*;
