use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{OrderRequest, PlacedOrder};

pub mod discovery;
pub mod layout;
pub mod openbook;

pub use layout::MarketDescriptor;
pub use openbook::OpenBookMarket;

/// A market that can turn order requests into signable instructions.
#[async_trait]
pub trait MarketContext: Send + Sync {
    fn descriptor(&self) -> &MarketDescriptor;

    async fn make_place_order(&self, request: &OrderRequest) -> Result<PlacedOrder>;
}
