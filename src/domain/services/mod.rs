pub mod api_service;
mod bubble_list;
mod conversation;
mod scroll;
mod session_store;
pub mod tables;
mod timers;

pub use bubble_list::*;
pub use conversation::*;
pub use scroll::*;
pub use session_store::*;
pub use timers::*;
