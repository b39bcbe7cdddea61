mod conversation;
mod plant;

pub use conversation::*;
pub use plant::*;
