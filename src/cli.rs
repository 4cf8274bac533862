use crate::api::{Endpoint, Session};
use crate::listing::Filters;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "bizbooker",
    version,
    about = "Browse BizBooker listings in the terminal with infinite scroll"
)]
pub struct CliArgs {
    /// Path to the TOML config file
    #[arg(long = "config", value_name = "PATH", default_value = "config.toml")]
    pub config_path: PathBuf,

    /// Items per page (overrides listing.page_size)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// Print every page to stdout instead of opening the browser
    #[arg(long)]
    pub dump: bool,

    #[command(subcommand)]
    listing: Option<ListingArg>,
}

impl CliArgs {
    /// The chosen listing; all businesses when none was given.
    pub fn listing(&self) -> ListingArg {
        self.listing
            .clone()
            .unwrap_or(ListingArg::Businesses { city: Vec::new() })
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ListingArg {
    /// All businesses, optionally in one city
    Businesses {
        #[arg(value_name = "CITY")]
        city: Vec<String>,
    },
    /// Businesses in a category
    Category {
        #[arg(value_name = "NAME", required = true)]
        name: Vec<String>,
    },
    /// Full-text business search
    Search {
        #[arg(value_name = "TERM", required = true)]
        term: Vec<String>,
    },
    /// Your appointments (requires login)
    Appointments,
    /// Bookings received by a business (requires login)
    Bookings {
        business_id: i64,
        status: Option<String>,
    },
}

impl ListingArg {
    pub fn needs_login(&self) -> bool {
        matches!(self, ListingArg::Appointments | ListingArg::Bookings { .. })
    }

    pub fn needs_user_id(&self) -> bool {
        matches!(self, ListingArg::Appointments)
    }

    pub fn endpoint(&self, session: &Session) -> Result<Endpoint> {
        Ok(match self {
            ListingArg::Businesses { .. } => Endpoint::Businesses,
            ListingArg::Category { name } => Endpoint::Category(name.join(" ")),
            ListingArg::Search { .. } => Endpoint::Search,
            ListingArg::Appointments => Endpoint::Appointments {
                user_id: session.require_user_id()?.to_string(),
            },
            ListingArg::Bookings { business_id, .. } => Endpoint::Bookings {
                business_id: *business_id,
            },
        })
    }

    /// Filters the listing starts with.
    pub fn initial_filters(&self) -> Filters {
        let mut filters = Filters::new();
        match self {
            ListingArg::Businesses { city } => filters.set("city", Some(city.join(" ").as_str())),
            ListingArg::Search { term } => filters.set("query", Some(term.join(" ").as_str())),
            ListingArg::Bookings { status, .. } => filters.set("status", status.as_deref()),
            ListingArg::Category { .. } | ListingArg::Appointments => {}
        }
        filters
    }
}
