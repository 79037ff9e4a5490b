mod auth;
mod build;
pub mod decode;
mod evaluation;
mod jobset;
mod project;
mod search;

pub use auth::*;
pub use build::*;
pub use evaluation::*;
pub use jobset::*;
pub use project::*;
pub use search::*;
