//! Services module for submission-service.

pub mod activity;
pub mod authz;
pub mod database;
pub mod deadline;
pub mod invitation;
pub mod jwt;
pub mod metrics;
pub mod store;
pub mod workflow;

pub use activity::ActivityLog;
pub use database::Database;
pub use invitation::InvitationService;
pub use jwt::{AccessTokenClaims, JwtService};
pub use metrics::{get_metrics, init_metrics};
pub use store::SubmissionStore;
pub use workflow::{InvoiceAction, InvoiceWorkflow};
