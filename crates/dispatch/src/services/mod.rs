//! Service layer.
//!
//! - [`mailer`] - The `Mailer` trait, delivery types and backend selection
//! - [`resend`] - Resend HTTP API backend
//! - [`smtp`] - SMTP backend via lettre
//! - [`dispatch`] - The campaign dispatch function

pub mod dispatch;
pub mod mailer;
pub mod resend;
pub mod smtp;

pub use dispatch::{
    CampaignSendResponse, DispatchCommand, DispatchError, DispatchResponse, Dispatcher,
    RecipientResult, RecipientStatus, SendEmailRequest, SingleSendResponse,
};
pub use mailer::{
    Delivery, LogMailer, Mailer, MailerError, OutboundEmail, SIMULATED_MESSAGE, build_mailer,
};
pub use resend::ResendMailer;
pub use smtp::SmtpMailer;
