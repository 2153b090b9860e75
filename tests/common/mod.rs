pub mod asserts;
pub mod fixtures;
pub mod jobs;

pub use asserts::*;
pub use fixtures::*;
pub use jobs::*;
