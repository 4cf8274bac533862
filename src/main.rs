use anyhow::Result;
use bizbooker::api::types::{Appointment, Booking, Business};
use bizbooker::api::{BizBookerRest, Endpoint, RestSource};
use bizbooker::cli::{CliArgs, ListingArg};
use bizbooker::config::Config;
use bizbooker::dump::dump;
use bizbooker::listing::{DetailSource, FetchListController, PageSource, VisibilitySentinel};
use bizbooker::tui::rows::ListRow;
use bizbooker::tui::state::ViewState;
use bizbooker::tui::{self, ListView};
use clap::Parser;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let listing = args.listing();

    let log_file = std::fs::File::create("bizbooker.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bizbooker=info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load(&args.config_path)?;

    // Load saved credentials from .env (real env vars take precedence)
    Config::load_env_file();

    let session = if listing.needs_login() {
        Config::login_session(listing.needs_user_id())?
    } else {
        Config::session_from_env()
    };
    tracing::info!(
        listing = ?listing,
        authenticated = session.is_authenticated(),
        "starting"
    );

    let endpoint = listing.endpoint(&session)?;
    let rest = Arc::new(BizBookerRest::new(
        Arc::new(session),
        &config.api.base_url,
        Duration::from_millis(config.api.request_timeout_ms),
    )?);

    match &listing {
        ListingArg::Businesses { .. } | ListingArg::Category { .. } | ListingArg::Search { .. } => {
            run_listing::<Business>(&args, &listing, &config, rest, endpoint).await
        }
        ListingArg::Appointments => {
            run_listing::<Appointment>(&args, &listing, &config, rest, endpoint).await
        }
        ListingArg::Bookings { .. } => {
            run_listing::<Booking>(&args, &listing, &config, rest, endpoint).await
        }
    }
}

async fn run_listing<T>(
    args: &CliArgs,
    listing: &ListingArg,
    config: &Config,
    rest: Arc<BizBookerRest>,
    endpoint: Endpoint,
) -> Result<()>
where
    T: ListRow + DeserializeOwned + Clone + Send + 'static,
{
    let page_size = args.page_size.unwrap_or(config.listing.page_size);
    let title = endpoint.label();
    let filter_key = endpoint.text_filter();
    let source = Arc::new(RestSource::<T>::new(rest, endpoint));
    let pages: Arc<dyn PageSource<T>> = source.clone();
    let details: Arc<dyn DetailSource<T>> = source;
    let mut controller = FetchListController::new(pages, page_size);
    let filters = listing.initial_filters();

    if args.dump {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let count = dump(&mut controller, filters, &mut out).await?;
        tracing::info!(count, "dump complete");
        return Ok(());
    }

    controller.reset(filters);
    let list_view = ListView {
        controller,
        details,
        sentinel: VisibilitySentinel::new(config.listing.sentinel_threshold),
        view: ViewState::new(title, filter_key),
        tick: Duration::from_millis(config.tui.tick_ms),
    };
    tui::run_tui(list_view).await
}
