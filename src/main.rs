use clap::error::ErrorKind;
use clap::Parser;
use hms_receipt::utils::{logger, validation::Validate};
use hms_receipt::{
    render, Artifact, DocumentBuilder, LocalStorage, MailDispatcher, ReceiptArgs, ReceiptEngine,
    ReceiptError, ReceiptRequest, ReceiptSettings, Result, SmtpRelay,
};
use serde::Serialize;

#[derive(Serialize)]
struct DryRunSummary<'a> {
    request: &'a ReceiptRequest,
    artifact: &'a Artifact,
    would_send_to: &'a str,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match ReceiptArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            // 參數錯誤：在任何檔案或網路 I/O 之前結束
            let usage = ReceiptError::usage(e.to_string());
            eprint!("{}", e.render());
            std::process::exit(usage.exit_code());
        }
    };

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting hms-receipt");

    if let Err(e) = run(args).await {
        tracing::error!(
            "❌ Receipt run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(args: ReceiptArgs) -> Result<()> {
    let request = args.to_request()?;

    let storage = LocalStorage::new(&args.output_dir);
    let builder = DocumentBuilder::new(storage.clone());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the receipt will not be sent");
        let artifact = render(&builder, &request).await?;
        let summary = DryRunSummary {
            request: &request,
            artifact: &artifact,
            would_send_to: &request.patient_email,
        };
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| ReceiptError::rendering(format!("dry run summary: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    // 憑證在啟動時載入一次，之後不再變動
    let settings = ReceiptSettings::load(args.config.as_deref())?;
    settings.validate()?;
    tracing::debug!("SMTP settings: {:?}", settings.smtp);

    let relay = SmtpRelay::new(&settings.smtp)?;
    let dispatcher = MailDispatcher::new(storage, relay, &settings.smtp)?;
    let engine = ReceiptEngine::new(builder, dispatcher);

    engine.run(&request).await?;
    println!("Receipt sent successfully!");
    Ok(())
}
