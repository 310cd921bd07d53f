use crate::utils::error::{ReceiptError, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Positional order of the receipt fields on the command line.
pub const FIELD_NAMES: [&str; 9] = [
    "appointment_id",
    "patient_name",
    "patient_email",
    "total_amount",
    "payment_method",
    "appointment_date",
    "appointment_time",
    "doctor_name",
    "service_type",
];

/// The nine fields of a completed appointment, kept as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptRequest {
    pub appointment_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub total_amount: String,
    pub payment_method: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub doctor_name: String,
    pub service_type: String,
}

impl ReceiptRequest {
    /// 依照命令列順序建立請求，欄位數量或空值錯誤時回傳 UsageError
    pub fn from_fields<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let [appointment_id, patient_name, patient_email, total_amount, payment_method, appointment_date, appointment_time, doctor_name, service_type]: [String; 9] =
            fields.try_into().map_err(|given: Vec<String>| {
                ReceiptError::usage(format!(
                    "expected {} arguments ({}), got {}",
                    FIELD_NAMES.len(),
                    FIELD_NAMES.join(", "),
                    given.len()
                ))
            })?;

        let request = Self {
            appointment_id,
            patient_name,
            patient_email,
            total_amount,
            payment_method,
            appointment_date,
            appointment_time,
            doctor_name,
            service_type,
        };
        request.ensure_present()?;
        Ok(request)
    }

    pub fn fields(&self) -> [(&'static str, &str); 9] {
        [
            (FIELD_NAMES[0], &self.appointment_id),
            (FIELD_NAMES[1], &self.patient_name),
            (FIELD_NAMES[2], &self.patient_email),
            (FIELD_NAMES[3], &self.total_amount),
            (FIELD_NAMES[4], &self.payment_method),
            (FIELD_NAMES[5], &self.appointment_date),
            (FIELD_NAMES[6], &self.appointment_time),
            (FIELD_NAMES[7], &self.doctor_name),
            (FIELD_NAMES[8], &self.service_type),
        ]
    }

    pub fn ensure_present(&self) -> Result<()> {
        for (name, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(ReceiptError::usage(format!("{} cannot be empty", name)));
            }
        }
        Ok(())
    }

    pub fn artifact_file_name(&self) -> String {
        format!("receipt_{}.pdf", self.appointment_id)
    }
}

/// A rendered receipt left on local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchState {
    Composing,
    Connected,
    Sent,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Composing => "composing",
            Self::Connected => "connected",
            Self::Sent => "sent",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub artifact: Artifact,
    pub recipient: String,
    pub state: DispatchState,
    /// Every state the dispatch passed through, in order.
    pub transitions: Vec<DispatchState>,
    pub relay_response: String,
}
