use crate::utils::error::{ReceiptError, Result};
use crate::utils::validation::{
    validate_mailbox, validate_non_empty_string, validate_range, validate_required_field,
    Validate,
};
use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const SENDER_EMAIL_ENV: &str = "HMS_SENDER_EMAIL";
pub const SENDER_PASSWORD_ENV: &str = "HMS_SENDER_PASSWORD";

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptSettings {
    #[serde(default)]
    pub smtp: SmtpSettings,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            sender_email: None,
            sender_password: None,
        }
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("sender_email", &self.sender_email)
            .field(
                "sender_password",
                &self.sender_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl SmtpSettings {
    /// 寄件者信箱與密碼，缺少時回傳設定錯誤
    pub fn credentials(&self) -> Result<(Mailbox, String)> {
        let email = validate_required_field("smtp.sender_email", &self.sender_email)?;
        let password = validate_required_field("smtp.sender_password", &self.sender_password)?;
        validate_non_empty_string("smtp.sender_password", password)?;
        let mailbox = validate_mailbox("smtp.sender_email", email)?;
        Ok((mailbox, password.clone()))
    }
}

impl Validate for SmtpSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("smtp.host", &self.host)?;
        validate_range("smtp.port", self.port, 1, u16::MAX)?;
        validate_range("smtp.timeout_seconds", self.timeout_seconds, 1, 600)?;
        self.credentials().map(|_| ())
    }
}

impl ReceiptSettings {
    /// 預設值 → 設定檔 → 環境變數
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ReceiptError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReceiptError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${HMS_SENDER_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReceiptError::ConfigError {
            message: format!("placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Fills credentials that are still unset (or left as an unresolved placeholder).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn unset(value: &Option<String>) -> bool {
            value
                .as_deref()
                .map(|v| v.trim().is_empty() || v.contains("${"))
                .unwrap_or(true)
        }

        if unset(&self.smtp.sender_email) {
            if let Some(email) = lookup(SENDER_EMAIL_ENV) {
                self.smtp.sender_email = Some(email);
            }
        }
        if unset(&self.smtp.sender_password) {
            if let Some(password) = lookup(SENDER_PASSWORD_ENV) {
                self.smtp.sender_password = Some(password);
            }
        }
    }
}

impl Validate for ReceiptSettings {
    fn validate(&self) -> Result<()> {
        self.smtp.validate()
    }
}
