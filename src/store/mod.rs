//! Entity Store: CRUD per clinical entity, keyed by integer id.
//!
//! Every function takes the pool explicitly. Single-statement writes rely on
//! statement atomicity; multi-statement writes open a transaction that rolls
//! back when dropped and only commits on the success path.

pub mod appointments;
pub mod doctors;
pub mod medicines;
pub mod patients;
pub mod users;
