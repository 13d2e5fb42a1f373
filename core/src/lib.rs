// grocer/src/lib.rs

//! Grocer: the domain library behind the Grocer storefront API.
//!
//! It owns the relational schema (SQLite through sqlx) and the service layer
//! that applies the storefront's business rules:
//!  - One cart per user, one cart row per product, quantities merged on add.
//!  - Products always carry at least one variant; `has_size` follows the variants.
//!  - Product create/update/delete and order placement run in a single transaction.
//!  - Reviews are unique per (user, product) and aggregated on every read.
//!  - Password reset is an explicit state machine over the user row.
//!
//! HTTP concerns live in the `grocer_server` crate; everything here takes a
//! `SqlitePool` and plain values.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::config::{AppConfig, AuthSettings, MailSettings, ShippingPolicy};
pub use crate::error::{ErrCode, GrocerError, Result};
pub use crate::services::mailer::{LogMailer, Mailer, OutgoingEmail, SentEmail};
