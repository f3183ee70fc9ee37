use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use seatcart::application::catalog::CatalogAdapter;
use seatcart::application::session::BookingSession;
use seatcart::config::{ClientConfig, parse_fee};
use seatcart::domain::checkout::CheckoutResult;
use seatcart::domain::ports::SharedBookingService;
use seatcart::infrastructure::host::{StaticToken, StderrNotifier};
use seatcart::infrastructure::http::HttpBookingService;
use seatcart::infrastructure::in_memory::InMemoryBookingService;
use seatcart::interfaces::csv::offering_reader::OfferingReader;
use seatcart::interfaces::csv::report_writer::ReportWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Booking service base URL (overrides SEATCART_BASE_URL)
    #[arg(long, global = true, conflicts_with = "catalog")]
    base_url: Option<String>,

    /// Serve routes from a CSV catalog instead of the booking service
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Identity token (overrides SEATCART_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Flat service fee added to the order total
    #[arg(long, global = true)]
    service_fee: Option<String>,

    /// Give up on a checkout after this many seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the route catalog
    Routes,
    /// Fill a cart and check it out
    Checkout {
        /// Route to add, as ID or ID:SEATS (repeatable)
        #[arg(long = "add", required = true, value_parser = parse_selection)]
        add: Vec<(String, u32)>,

        /// Offline only: the service refuses to stage this route
        #[arg(long)]
        reject_line: Vec<String>,

        /// Offline only: the service refuses the final confirmation
        #[arg(long)]
        reject_confirm: bool,
    },
    /// Print the signed-in user's bookings
    History,
}

fn parse_selection(raw: &str) -> std::result::Result<(String, u32), String> {
    let (id, seats) = match raw.split_once(':') {
        Some((id, seats)) => {
            let seats = seats
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("invalid seat count in '{raw}'"))?;
            (id.trim(), seats)
        }
        None => (raw.trim(), 1),
    };
    if id.is_empty() {
        return Err(format!("missing route id in '{raw}'"));
    }
    Ok((id.to_string(), seats))
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().into_diagnostic()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    if let Some(fee) = &cli.service_fee {
        config.service_fee = parse_fee(fee).into_diagnostic()?;
    }
    if let Some(secs) = cli.timeout_secs {
        config.commit_timeout = Some(Duration::from_secs(secs));
    }
    Ok(config)
}

async fn connect(cli: &Cli, config: &ClientConfig) -> Result<SharedBookingService> {
    let Some(path) = &cli.catalog else {
        if let Command::Checkout {
            reject_line,
            reject_confirm,
            ..
        } = &cli.command
            && (!reject_line.is_empty() || *reject_confirm)
        {
            tracing::warn!("failure scripting only applies to --catalog mode; ignoring");
        }
        let service = HttpBookingService::from_config(config).into_diagnostic()?;
        return Ok(Arc::new(service));
    };

    let file = File::open(path).into_diagnostic()?;
    let records = OfferingReader::new(file)
        .offerings()
        .collect::<seatcart::error::Result<Vec<_>>>()
        .into_diagnostic()?;
    let service = InMemoryBookingService::with_offerings(records);

    if let Command::Checkout {
        reject_line,
        reject_confirm,
        ..
    } = &cli.command
    {
        for id in reject_line {
            service
                .reject_line(id.as_str(), format!("Route {id} is no longer available"))
                .await;
        }
        if *reject_confirm {
            service.reject_confirm("Payment declined").await;
        }
    }
    Ok(Arc::new(service))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let service = connect(&cli, &config).await?;

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());

    match &cli.command {
        Command::Routes => {
            let fetch = CatalogAdapter::new(service).fetch_offerings().await;
            if let Some(e) = fetch.error {
                return Err(miette!("could not load routes: {e}"));
            }
            if fetch.dropped > 0 {
                eprintln!("skipped {} malformed route(s)", fetch.dropped);
            }
            writer.write_offerings(&fetch.offerings).into_diagnostic()?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Checkout { add, .. } => {
            let mut session = BookingSession::from_config(
                service,
                Box::new(StaticToken::new(config.token.clone())),
                Box::new(StderrNotifier),
                &config,
            );
            session.load_catalog().await;

            for (id, seats) in add {
                for _ in 0..*seats {
                    if !session.add_by_id(id).into_diagnostic()?.changed() {
                        break;
                    }
                }
            }

            writer
                .write_cart(session.cart(), &session.summary())
                .into_diagnostic()?;
            let result = session.checkout().await.into_diagnostic()?;
            writer.write_outcome(&result).into_diagnostic()?;

            Ok(match result {
                CheckoutResult::Completed { .. } => ExitCode::SUCCESS,
                CheckoutResult::Failed(_) => ExitCode::FAILURE,
            })
        }
        Command::History => {
            let session = BookingSession::from_config(
                service,
                Box::new(StaticToken::new(config.token.clone())),
                Box::new(StderrNotifier),
                &config,
            );
            let fetch = session.booking_history().await;
            if fetch.error.is_some() {
                return Ok(ExitCode::FAILURE);
            }
            writer.write_bookings(&fetch.bookings).into_diagnostic()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
