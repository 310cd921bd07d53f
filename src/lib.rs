pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{smtp::SmtpRelay, storage::LocalStorage};
pub use config::{ReceiptArgs, ReceiptSettings, SmtpSettings};
pub use core::{
    document::DocumentBuilder,
    mailer::MailDispatcher,
    receipt::{render, ReceiptEngine},
};
pub use domain::model::{Artifact, DeliveryReport, DispatchState, ReceiptRequest};
pub use utils::error::{ReceiptError, Result};
