//! Module for database repositories.
//!
//! Repositories own the persistence queries for their entity and keep SQL
//! out of the service layer.

pub mod user_repository;
