//! Row models of the experiment database.
//!
//! Every struct is `FromRow` + `Serialize`. The tables are produced upstream,
//! so there are no create/update DTOs.

pub mod ai;
pub mod concatenation;
pub mod metadata;
pub mod tracking;
