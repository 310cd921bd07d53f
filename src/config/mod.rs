pub mod toml_config;

use crate::domain::model::ReceiptRequest;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

pub use toml_config::{ReceiptSettings, SmtpSettings};

#[derive(Debug, Clone, Parser)]
#[command(name = "hms-receipt")]
#[command(about = "Render an appointment receipt as PDF and email it to the patient")]
pub struct ReceiptArgs {
    // 欄位原樣傳入：允許以 '-' 開頭的值（例如 -5.00）
    #[arg(allow_hyphen_values = true)]
    pub appointment_id: String,
    #[arg(allow_hyphen_values = true)]
    pub patient_name: String,
    #[arg(allow_hyphen_values = true)]
    pub patient_email: String,
    #[arg(allow_hyphen_values = true)]
    pub total_amount: String,
    #[arg(allow_hyphen_values = true)]
    pub payment_method: String,
    #[arg(allow_hyphen_values = true)]
    pub appointment_date: String,
    #[arg(allow_hyphen_values = true)]
    pub appointment_time: String,
    #[arg(allow_hyphen_values = true)]
    pub doctor_name: String,
    #[arg(allow_hyphen_values = true)]
    pub service_type: String,

    /// Path to TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the receipt is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Render the receipt without sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl ReceiptArgs {
    pub fn to_request(&self) -> Result<ReceiptRequest> {
        ReceiptRequest::from_fields([
            self.appointment_id.as_str(),
            self.patient_name.as_str(),
            self.patient_email.as_str(),
            self.total_amount.as_str(),
            self.payment_method.as_str(),
            self.appointment_date.as_str(),
            self.appointment_time.as_str(),
            self.doctor_name.as_str(),
            self.service_type.as_str(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARGS: [&str; 10] = [
        "hms-receipt",
        "A100",
        "Jane Doe",
        "jane@example.com",
        "250.00",
        "Credit Card",
        "2024-05-01",
        "10:30",
        "Dr. Smith",
        "Consultation",
    ];

    #[test]
    fn test_parse_nine_positionals() {
        let args = ReceiptArgs::try_parse_from(ARGS).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(!args.dry_run);

        let request = args.to_request().unwrap();
        assert_eq!(request.patient_name, "Jane Doe");
        assert_eq!(request.service_type, "Consultation");
    }

    #[test]
    fn test_missing_positional_is_rejected() {
        assert!(ReceiptArgs::try_parse_from(&ARGS[..9]).is_err());
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        let mut args = ARGS.to_vec();
        args.push("surplus");
        assert!(ReceiptArgs::try_parse_from(args).is_err());
    }

    #[test]
    fn test_hyphen_leading_values_are_fields() {
        let mut args = ARGS.to_vec();
        args[4] = "-5.00";
        args[9] = "-walk-in";
        args.extend(["--dry-run"]);

        let parsed = ReceiptArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.total_amount, "-5.00");
        assert_eq!(parsed.service_type, "-walk-in");
        assert!(parsed.dry_run);

        let request = parsed.to_request().unwrap();
        assert_eq!(request.total_amount, "-5.00");
    }

    #[test]
    fn test_long_hyphen_value_in_middle_position() {
        let mut args = ARGS.to_vec();
        args[5] = "--cash--";
        let parsed = ReceiptArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.payment_method, "--cash--");
        assert!(!parsed.dry_run);
    }

    #[test]
    fn test_flags_after_positionals() {
        let mut args = ARGS.to_vec();
        args.extend(["--dry-run", "-o", "/tmp/receipts", "-v"]);
        let parsed = ReceiptArgs::try_parse_from(args).unwrap();
        assert!(parsed.dry_run);
        assert!(parsed.verbose);
        assert_eq!(parsed.output_dir, PathBuf::from("/tmp/receipts"));
    }
}
