use crate::utils::error::Result;
use async_trait::async_trait;
use lettre::Message;
use std::path::PathBuf;

/// Local storage for rendered artifacts. Paths are relative to the store root.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str)
        -> impl std::future::Future<Output = std::io::Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = std::io::Result<()>> + Send;
    fn resolve(&self, path: &str) -> PathBuf;
}

/// Opens an authenticated session to the mail relay.
///
/// A session returned from `connect` has completed the handshake and
/// authentication; failures up to that point belong to the transport.
#[async_trait]
pub trait MailTransport: Send + Sync {
    type Session: MailSession;

    async fn connect(&self) -> Result<Self::Session>;
}

/// One connected relay session. Sends a composed message and returns the
/// relay's reply code.
#[async_trait]
pub trait MailSession: Send {
    async fn send(&mut self, message: &Message) -> Result<String>;
}
