//! HTTP handlers for submission-service.

pub mod health;
pub mod invitations;
pub mod invoices;
