use crate::config::SmtpSettings;
use crate::domain::model::DispatchState;
use crate::domain::ports::{MailSession, MailTransport};
use crate::utils::error::{ReceiptError, Result};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::Error as SmtpError;
use lettre::Message;
use std::future::Future;
use std::time::Duration;

const AUTH_MECHANISMS: [Mechanism; 2] = [Mechanism::Plain, Mechanism::Login];

/// Outbound relay reached over STARTTLS with login credentials.
/// One session per receipt; no pooling, no retries.
pub struct SmtpRelay {
    host: String,
    port: u16,
    timeout: Duration,
    credentials: Credentials,
    hello: ClientId,
    // None 只用於測試中的明文 relay
    tls: Option<TlsParameters>,
    endpoint: String,
}

impl SmtpRelay {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let tls = TlsParameters::new(settings.host.clone()).map_err(|e| {
            ReceiptError::ConfigError {
                message: format!("cannot prepare TLS for {}: {}", settings.host, e),
            }
        })?;
        Self::build(settings, Some(tls))
    }

    /// Relay without STARTTLS, for talking to a local test server.
    #[cfg(test)]
    fn plaintext(settings: &SmtpSettings) -> Result<Self> {
        Self::build(settings, None)
    }

    fn build(settings: &SmtpSettings, tls: Option<TlsParameters>) -> Result<Self> {
        let (sender, password) = settings.credentials()?;
        Ok(Self {
            host: settings.host.clone(),
            port: settings.port,
            timeout: Duration::from_secs(settings.timeout_seconds),
            credentials: Credentials::new(sender.email.to_string(), password),
            hello: ClientId::default(),
            tls,
            endpoint: format!("{}:{}", settings.host, settings.port),
        })
    }

    async fn handshake(&self) -> Result<AsyncSmtpConnection> {
        let mut connection = AsyncSmtpConnection::connect_tokio1(
            (self.host.as_str(), self.port),
            Some(self.timeout),
            &self.hello,
            None,
            None,
        )
        .await
        .map_err(|e| connection_failed(&self.endpoint, e))?;

        if let Some(tls) = &self.tls {
            if !connection.can_starttls() {
                connection.abort().await;
                return Err(ReceiptError::delivery(format!(
                    "{} does not offer STARTTLS",
                    self.endpoint
                )));
            }
            connection
                .starttls(tls.clone(), &self.hello)
                .await
                .map_err(|e| connection_failed(&self.endpoint, e))?;
        }

        // 驗證階段的任何失敗都視為憑證被拒
        if let Err(e) = connection.auth(&AUTH_MECHANISMS, &self.credentials).await {
            connection.abort().await;
            return Err(ReceiptError::AuthenticationError {
                message: format!("{} refused the credentials: {}", self.endpoint, e),
            });
        }

        Ok(connection)
    }
}

#[async_trait]
impl MailTransport for SmtpRelay {
    type Session = SmtpSession;

    async fn connect(&self) -> Result<SmtpSession> {
        tracing::debug!("Opening session to {}", self.endpoint);

        let connection = within(self.timeout, &self.endpoint, self.handshake()).await?;

        Ok(SmtpSession {
            connection,
            endpoint: self.endpoint.clone(),
            timeout: self.timeout,
        })
    }
}

/// Authenticated session handed out by [`SmtpRelay::connect`].
pub struct SmtpSession {
    connection: AsyncSmtpConnection,
    endpoint: String,
    timeout: Duration,
}

#[async_trait]
impl MailSession for SmtpSession {
    async fn send(&mut self, message: &Message) -> Result<String> {
        let endpoint = self.endpoint.clone();
        let body = message.formatted();
        let connection = &mut self.connection;

        let response = within(self.timeout, &endpoint, async {
            connection
                .send(message.envelope(), &body)
                .await
                .map_err(|e| {
                    ReceiptError::delivery(format!(
                        "{} refused the message while {}: {}",
                        endpoint,
                        DispatchState::Connected,
                        e
                    ))
                })
        })
        .await?;

        if let Err(e) = self.connection.quit().await {
            tracing::debug!("QUIT to {} failed after delivery: {}", self.endpoint, e);
        }

        let code = response.code().to_string();
        tracing::debug!("Relay {} accepted message with {}", self.endpoint, code);
        Ok(code)
    }
}

fn connection_failed(endpoint: &str, err: SmtpError) -> ReceiptError {
    ReceiptError::delivery(format!("connection to {} failed: {}", endpoint, err))
}

async fn within<T>(
    timeout: Duration,
    endpoint: &str,
    step: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, step)
        .await
        .map_err(|_| ReceiptError::delivery(format!("session with {} timed out", endpoint)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// How the local relay answers.
    #[derive(Clone, Copy)]
    enum Script {
        Accept,
        RejectAuth,
        RejectData,
    }

    /// Minimal SMTP server for one connection. Returns the port and the verbs it saw.
    async fn local_relay(script: Script) -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let mut verbs = Vec::new();
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();

            write.write_all(b"220 relay.test ESMTP\r\n").await.unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                let verb = line
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                verbs.push(verb.clone());

                let reply: &[u8] = match (verb.as_str(), script) {
                    ("EHLO", _) => b"250-relay.test\r\n250 AUTH PLAIN LOGIN\r\n",
                    ("AUTH", Script::RejectAuth) => {
                        b"535 5.7.8 Username and Password not accepted\r\n"
                    }
                    ("AUTH", _) => b"235 2.7.0 Accepted\r\n",
                    ("MAIL", _) | ("RCPT", _) => b"250 2.1.0 OK\r\n",
                    ("DATA", _) => {
                        write.write_all(b"354 Go ahead\r\n").await.unwrap();
                        while let Ok(Some(data)) = lines.next_line().await {
                            if data == "." {
                                break;
                            }
                        }
                        match script {
                            Script::RejectData => b"550 5.7.1 Message rejected\r\n",
                            _ => b"250 2.0.0 Queued\r\n",
                        }
                    }
                    ("QUIT", _) => {
                        write.write_all(b"221 2.0.0 Bye\r\n").await.unwrap();
                        break;
                    }
                    _ => b"502 5.5.2 Unrecognized command\r\n",
                };
                if write.write_all(reply).await.is_err() {
                    break;
                }
            }
            verbs
        });

        (port, handle)
    }

    fn settings_with_credentials() -> SmtpSettings {
        SmtpSettings {
            sender_email: Some("billing@hospital.example".to_string()),
            sender_password: Some("app-password".to_string()),
            ..SmtpSettings::default()
        }
    }

    fn local_settings(port: u16) -> SmtpSettings {
        SmtpSettings {
            host: "127.0.0.1".to_string(),
            port,
            timeout_seconds: 5,
            ..settings_with_credentials()
        }
    }

    fn message() -> Message {
        Message::builder()
            .from("billing@hospital.example".parse().unwrap())
            .to("jane@example.com".parse().unwrap())
            .subject("HMS Appointment Receipt")
            .body(String::from("Please find your receipt attached."))
            .unwrap()
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = SmtpRelay::new(&SmtpSettings::default()).err().unwrap();
        assert!(matches!(err, ReceiptError::MissingConfigError { .. }));
    }

    #[test]
    fn test_new_prepares_starttls() {
        let relay = SmtpRelay::new(&settings_with_credentials()).unwrap();
        assert!(relay.tls.is_some());
        assert_eq!(relay.port, 587);
    }

    #[tokio::test]
    async fn test_auth_535_is_authentication_error() {
        let (port, server) = local_relay(Script::RejectAuth).await;
        let relay = SmtpRelay::plaintext(&local_settings(port)).unwrap();

        let err = relay.connect().await.err().unwrap();

        assert!(matches!(err, ReceiptError::AuthenticationError { .. }));
        assert_eq!(err.exit_code(), 7);
        let verbs = server.await.unwrap();
        assert!(verbs.contains(&"AUTH".to_string()));
        assert!(!verbs.contains(&"MAIL".to_string()));
    }

    #[tokio::test]
    async fn test_data_550_is_delivery_error() {
        let (port, server) = local_relay(Script::RejectData).await;
        let relay = SmtpRelay::plaintext(&local_settings(port)).unwrap();

        let mut session = relay.connect().await.unwrap();
        let err = session.send(&message()).await.unwrap_err();

        assert!(matches!(err, ReceiptError::DeliveryError { .. }));
        assert_eq!(err.exit_code(), 8);
        assert!(err.to_string().contains("connected"));
        drop(session);
        assert!(server.await.unwrap().contains(&"DATA".to_string()));
    }

    #[tokio::test]
    async fn test_accepted_message_returns_reply_code() {
        let (port, server) = local_relay(Script::Accept).await;
        let relay = SmtpRelay::plaintext(&local_settings(port)).unwrap();

        let mut session = relay.connect().await.unwrap();
        let code = session.send(&message()).await.unwrap();

        assert_eq!(code, "250");
        let verbs = server.await.unwrap();
        assert_eq!(verbs, ["EHLO", "AUTH", "MAIL", "RCPT", "DATA", "QUIT"]);
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_delivery_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let relay = SmtpRelay::plaintext(&local_settings(port)).unwrap();

        let err = relay.connect().await.err().unwrap();

        assert!(matches!(err, ReceiptError::DeliveryError { .. }));
        assert_eq!(err.exit_code(), 8);
    }
}
