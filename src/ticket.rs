//! Ticket-domain identifiers, reference instants, and issued login tickets.

pub mod id;
pub mod instant;
pub mod login;

pub use id::*;
pub use instant::*;
pub use login::*;
