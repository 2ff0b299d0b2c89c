//! HDX resource chooser engine
//!
//! Lets a user drill down through the HDX catalog (locations, then tags,
//! then datasets, then resources, or a free-text search) and hands the
//! selected resource back to whoever opened the chooser.
//!
//! ## Components
//!
//! - [`cache`]: response cache and in-flight request coalescing in front of
//!   a [`hdx_client::CatalogGateway`]
//! - [`tags`]: counted tag listing of a location
//! - [`context`] / [`codec`]: where the user is, and its bookmark token
//! - [`navigation`]: the state machine front ends drive
//! - [`handoff`]: exactly-once delivery of the selected resource
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hdx_chooser::{handoff, CachedCatalog, HandoffMode, NavigationService};
//! use hdx_client::{CatalogClient, CatalogConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogClient::new(CatalogConfig::default())?;
//! let catalog = CachedCatalog::new(Arc::new(client));
//!
//! let (sender, receiver) = handoff::channel();
//! let (service, mut events) = NavigationService::new(catalog, HandoffMode::Opener(sender));
//! service.restore("haiti,3w").await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//!     # break;
//! }
//! let _chosen = receiver.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod handoff;
pub mod navigation;
pub mod tags;
pub mod terminal;

pub use cache::{CacheStats, CachedCatalog, RequestSignature, ResponseCache};
pub use codec::{decode, encode, parse, DecodeFailure, TokenPath};
pub use context::{ChooserState, NavigationContext, Provenance};
pub use error::{ChooserError, Result};
pub use handoff::{HandoffMode, HandoffReceiver, HandoffSender};
pub use navigation::{
    Breadcrumb, CloseReason, Listing, NavigationEvent, NavigationService, NoticeLevel,
    RenderRequest, Selected, Transition,
};
pub use tags::{aggregate_tags, CountedTag};
