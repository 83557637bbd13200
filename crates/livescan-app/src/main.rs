// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live Scan: photograph a paper form and deliver it by email or SMS.
//
// Entry point. Initialises logging, resolves configuration and runs one of
// the two journeys: scanning a form, or redeeming a download link.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use livescan_core::error::Result;
use livescan_core::human_errors::{classify_error, humanize_error};
use livescan_core::types::{ConsentKind, ErrorClass};
use livescan_workflow::Phase;
use tracing::{error, info};

use services::app_services::AppServices;

#[derive(Parser)]
#[command(name = "livescan", version)]
#[command(about = "Photograph a paper form and deliver it by email or SMS", long_about = None)]
struct Cli {
    /// Delivery service origin (overrides config.json and LIVESCAN_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a form, consent to sharing it, and deliver it
    Scan(ScanArgs),
    /// Download a finished form with the PIN from its text message
    Redeem {
        /// Token from the download link
        token: String,
        #[arg(long)]
        pin: String,
        /// Directory to save into (defaults to the configured download dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check that the delivery service is reachable
    Health,
}

#[derive(Args)]
struct ScanArgs {
    /// Image served as the camera frame
    #[arg(long)]
    frame: PathBuf,

    /// Primary recipient
    #[arg(long)]
    email: String,

    /// Additional recipients, comma separated
    #[arg(long, default_value = "")]
    cc: String,

    /// Phone number for an SMS download link (E.164)
    #[arg(long, default_value = "")]
    phone: String,

    /// Agree to receive the SMS download link
    #[arg(long)]
    sms_consent: bool,

    /// Agree to the document being shared with the recipients
    #[arg(long)]
    accept_terms: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Live Scan starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            exit_code(classify_error(&e))
        }
    }
}

/// sysexits-style codes so scripts can tell a retryable failure apart.
fn exit_code(class: ErrorClass) -> ExitCode {
    match class {
        // EX_TEMPFAIL
        ErrorClass::Transient => ExitCode::from(75),
        // EX_USAGE
        ErrorClass::UserAction => ExitCode::from(64),
        ErrorClass::Permanent => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let services = AppServices::init(cli.api_base)?;
    match cli.command {
        Command::Scan(args) => scan(&services, args).await,
        Command::Redeem { token, pin, out } => redeem(&services, &token, &pin, out).await,
        Command::Health => {
            services.health().await?;
            println!("{} is up", services.config().api_base);
            Ok(())
        }
    }
}

async fn scan(services: &AppServices, args: ScanArgs) -> Result<()> {
    let caps = services.capabilities(Some(args.frame), None)?;
    let mut flow = services.workflow(&caps);
    let receipts = services.consent_session().await;

    let image = flow.capture()?;
    println!(
        "Captured {}x{} ({} bytes)",
        image.width(),
        image.height(),
        image.jpeg_bytes().len()
    );

    flow.set_document_consent(args.accept_terms)?;
    flow.confirm()?;
    services
        .record_consent(receipts.as_ref(), ConsentKind::Document)
        .await;

    let progress = flow.subscribe_progress();
    let show_phases = async move {
        let Some(mut progress) = progress else {
            return;
        };
        let mut shown: Option<Phase> = None;
        while progress.changed().await.is_ok() {
            let tick = *progress.borrow_and_update();
            if shown != Some(tick.phase) {
                println!("  {}...", tick.phase);
                shown = Some(tick.phase);
            }
        }
    };
    let (outcome, ()) = tokio::join!(flow.wait_for_processing(), show_phases);
    outcome?;

    let has_phone = !args.phone.trim().is_empty();
    let form = flow.form_mut();
    form.primary_email = args.email;
    form.extra_emails = args.cc;
    form.phone = args.phone;
    form.sms_consent = args.sms_consent;
    if has_phone && args.sms_consent {
        services
            .record_consent(receipts.as_ref(), ConsentKind::Sms)
            .await;
    }

    let result = flow.submit().await?;
    println!("Sent to {}", result.sent_emails.join(", "));
    match result.sent_phone {
        Some(phone) => println!("Download link texted to {phone}"),
        None if has_phone => println!("SMS is not enabled on the service; no text was sent"),
        None => {}
    }
    flow.done()
}

async fn redeem(
    services: &AppServices,
    token: &str,
    pin: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let caps = services.capabilities(None, out)?;
    let mut flow = services.workflow(&caps);
    flow.open_redemption(services.verifier(&caps, token))?;

    let artifact = flow.verify_pin(pin).await?;
    println!(
        "Saved {} ({} bytes)",
        artifact.path.display(),
        artifact.size
    );
    flow.leave_redemption()
}
