use crate::config::SmtpSettings;
use crate::domain::model::{Artifact, DeliveryReport, DispatchState};
use crate::domain::ports::{MailSession, MailTransport, Storage};
use crate::utils::error::{ReceiptError, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

pub const SUBJECT: &str = "HMS Appointment Receipt";
pub const BODY: &str = "Please find your receipt attached.";
const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

pub struct MailDispatcher<S: Storage, T: MailTransport> {
    storage: S,
    transport: T,
    sender: Mailbox,
}

impl<S: Storage, T: MailTransport> MailDispatcher<S, T> {
    pub fn new(storage: S, transport: T, settings: &SmtpSettings) -> Result<Self> {
        let (sender, _) = settings.credentials()?;
        Ok(Self {
            storage,
            transport,
            sender,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 組出 multipart 郵件：純文字內文 + PDF 附件
    pub async fn compose(&self, recipient: &str, artifact: &Artifact) -> Result<Message> {
        let to: Mailbox = recipient.parse().map_err(|e| {
            ReceiptError::delivery(format!("invalid recipient address '{}': {}", recipient, e))
        })?;

        let data = self
            .storage
            .read_file(&artifact.file_name)
            .await
            .map_err(|source| ReceiptError::FileAccessError {
                path: artifact.path.clone(),
                source,
            })?;

        let content_type = ContentType::parse(ATTACHMENT_CONTENT_TYPE)
            .map_err(|e| ReceiptError::delivery(format!("attachment content type: {}", e)))?;

        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(SUBJECT)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(BODY.to_string()))
                    .singlepart(
                        Attachment::new(artifact.file_name.clone()).body(data, content_type),
                    ),
            )
            .map_err(|e| ReceiptError::delivery(format!("cannot build message: {}", e)))
    }

    /// Composing → Connected → Sent. A failure leaves the dispatch in the
    /// state it had reached; the artifact stays on disk.
    pub async fn dispatch(&self, recipient: &str, artifact: &Artifact) -> Result<DeliveryReport> {
        let mut transitions = Vec::with_capacity(3);
        let mut enter = |state: DispatchState| {
            tracing::debug!("Mail dispatch {} for {}", state, artifact.file_name);
            transitions.push(state);
            state
        };

        let mut state = enter(DispatchState::Composing);
        let message = self.compose(recipient, artifact).await?;

        let mut session = self.transport.connect().await.inspect_err(|e| {
            tracing::debug!("Mail dispatch aborted while {}: {}", state, e);
        })?;
        state = enter(DispatchState::Connected);

        let relay_response = session.send(&message).await.inspect_err(|e| {
            tracing::debug!("Mail dispatch aborted while {}: {}", state, e);
        })?;
        state = enter(DispatchState::Sent);
        tracing::debug!("Relay replied {}", relay_response);

        Ok(DeliveryReport {
            artifact: artifact.clone(),
            recipient: recipient.to_string(),
            state,
            transitions,
            relay_response,
        })
    }
}
