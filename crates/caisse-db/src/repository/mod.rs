//! # Repository Layer
//!
//! One repository per aggregate. The terminal store has a single
//! aggregate: the ticket queue.

pub mod ticket;

pub use ticket::TicketRepository;
