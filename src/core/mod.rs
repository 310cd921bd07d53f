pub mod document;
pub mod mailer;
pub mod receipt;

pub use crate::domain::model::{Artifact, DeliveryReport, DispatchState, ReceiptRequest};
pub use crate::domain::ports::{MailSession, MailTransport, Storage};
pub use crate::utils::error::Result;
