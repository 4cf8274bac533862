pub mod controller;
pub mod query;
pub mod sentinel;
pub mod state;

use crate::api::error::FetchError;
use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

pub use controller::FetchListController;
pub use query::{Filters, ListPage, ListQuery};
pub use sentinel::{Viewport, VisibilitySentinel};
pub use state::{Applied, FetchRequest, ListState, Phase};

/// An item with a stable identity, used to drop duplicates across pages.
pub trait Identified {
    type Id: Eq + Hash + Clone + Debug + Display + Send + Sync;

    fn id(&self) -> Self::Id;
}

/// Remote collection that can be read one page at a time.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
        filters: &Filters,
    ) -> Result<ListPage<T>, FetchError>;
}

/// Full record lookup for a single item of a listing.
#[async_trait]
pub trait DetailSource<T: Identified>: Send + Sync {
    async fn fetch_detail(&self, id: &T::Id) -> Result<T, FetchError>;
}
