pub mod assistants;
pub use assistants::*;

pub mod files;
pub mod messages;
pub mod runs;
pub mod stream;
pub mod threads;
