//! One function per query, each taking a `&DbPool` and returning
//! `Result<_, DbError>`.  Plain SQL, no domain rules.

pub mod impersonations;
pub mod super_admins;
