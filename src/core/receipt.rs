use crate::core::document::DocumentBuilder;
use crate::core::mailer::MailDispatcher;
use crate::domain::model::{Artifact, DeliveryReport, ReceiptRequest};
use crate::domain::ports::{MailTransport, Storage};
use crate::utils::error::Result;

/// Runs the two receipt steps in order: render, then mail.
pub struct ReceiptEngine<S: Storage, T: MailTransport> {
    builder: DocumentBuilder<S>,
    dispatcher: MailDispatcher<S, T>,
}

impl<S: Storage, T: MailTransport> ReceiptEngine<S, T> {
    pub fn new(builder: DocumentBuilder<S>, dispatcher: MailDispatcher<S, T>) -> Self {
        Self {
            builder,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &MailDispatcher<S, T> {
        &self.dispatcher
    }

    pub async fn run(&self, request: &ReceiptRequest) -> Result<DeliveryReport> {
        tracing::info!("Rendering receipt for appointment {}", request.appointment_id);
        let artifact = render(&self.builder, request).await?;

        // 產生的 PDF 即使寄送失敗也會留在磁碟上
        tracing::info!("Sending {} to {}", artifact.file_name, request.patient_email);
        let report = self
            .dispatcher
            .dispatch(&request.patient_email, &artifact)
            .await?;

        tracing::info!(
            "Receipt {} delivered to {}",
            report.artifact.file_name,
            report.recipient
        );
        Ok(report)
    }
}

/// Renders without sending; used for dry runs where no relay is configured.
pub async fn render<S: Storage>(
    builder: &DocumentBuilder<S>,
    request: &ReceiptRequest,
) -> Result<Artifact> {
    let artifact = builder.build(request).await?;
    tracing::info!(
        "Receipt written to {} ({} bytes)",
        artifact.path.display(),
        artifact.size_bytes
    );
    Ok(artifact)
}
