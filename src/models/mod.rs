//! Domain models for submission-service.

mod activity;
mod invitation;
mod invoice;
mod tenant;
mod user;

pub use activity::ActivityEvent;
pub use invitation::{
    CreateInvitationRequest, Invitation, InvitationPatch, InvitationResponse, InvitationStatus,
};
pub use invoice::{
    Invoice, InvoicePatch, InvoiceResponse, InvoiceStatus, SubmitInvoiceRequest,
};
pub use tenant::{DeadlineStrategy, SubmissionPolicy, Tenant};
pub use user::{AccountStatus, Principal, Role, User, UserResponse};
