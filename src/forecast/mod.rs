pub mod atmospheric;
pub mod history;
pub mod schema;
pub mod weather;

pub use atmospheric::*;
pub use history::*;
pub use schema::*;
pub use weather::*;
