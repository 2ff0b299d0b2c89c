//! Navigation service
//!
//! Owns the current context and drives the catalog on every transition.
//! Front ends call the async operations and consume [`NavigationEvent`]s from
//! the channel returned by [`NavigationService::new`].
//!
//! ## Staleness
//!
//! Every navigation takes a new generation number before it suspends. When
//! its data arrives it is applied only if no later navigation has started in
//! the meantime; otherwise the result is dropped and the caller gets
//! [`Transition::Superseded`]. Applying the context and emitting the render
//! happen in one critical section, so the render stream is never out of
//! order.

use std::sync::{Mutex, MutexGuard};

use hdx_client::Resource;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::render::{Listing, RenderRequest};
use crate::cache::CachedCatalog;
use crate::codec;
use crate::context::{ChooserState, NavigationContext};
use crate::error::{ChooserError, Result};
use crate::handoff::HandoffMode;

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Why the chooser session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseReason {
    /// A resource was handed to the opener
    Delivered,
    /// Closed without a selection
    Cancelled,
}

/// Output of the navigator, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Draw this screen
    Render(RenderRequest),
    /// Non-blocking message for the user
    Notice { level: NoticeLevel, message: String },
    /// Standalone selection: navigate to a download URL
    OpenUrl(String),
    /// The session is over; no further events follow
    Closed(CloseReason),
}

/// What a navigation request ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The new context was applied and rendered
    Rendered { generation: u64 },
    /// Already showing this context
    Unchanged,
    /// A later navigation started first; nothing was applied
    Superseded,
    /// Part of a token could not be restored; its deepest resolved ancestor
    /// was rendered instead
    Recovered { generation: u64, error: ChooserError },
}

/// Result of selecting a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected {
    /// Handed to the opener; the session is closed
    Delivered,
    /// No opener; the front end was told to open this URL
    OpenedUrl(String),
}

struct ServiceState {
    generation: u64,
    current: NavigationContext,
    listing: Option<Listing>,
    /// Token of the most recently requested context
    last_token: Option<String>,
    /// Token of the context on screen
    rendered_token: Option<String>,
    handoff: Option<HandoffMode>,
    closed: bool,
}

/// Navigation state machine
pub struct NavigationService {
    catalog: CachedCatalog,
    events: mpsc::UnboundedSender<NavigationEvent>,
    state: Mutex<ServiceState>,
}

impl NavigationService {
    pub fn new(
        catalog: CachedCatalog,
        handoff: HandoffMode,
    ) -> (Self, mpsc::UnboundedReceiver<NavigationEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let service = Self {
            catalog,
            events,
            state: Mutex::new(ServiceState {
                generation: 0,
                current: NavigationContext::Root,
                listing: None,
                last_token: None,
                rendered_token: None,
                handoff: Some(handoff),
                closed: false,
            }),
        };
        (service, rx)
    }

    pub fn catalog(&self) -> &CachedCatalog {
        &self.catalog
    }

    /// Context currently on screen
    pub fn current(&self) -> NavigationContext {
        self.lock().current.clone()
    }

    pub fn state(&self) -> ChooserState {
        self.lock().current.state()
    }

    /// Listing currently on screen, if anything was rendered yet
    pub fn listing(&self) -> Option<Listing> {
        self.lock().listing.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    // =========================================================================
    // Restoration
    // =========================================================================

    /// Restore a bookmark token.
    ///
    /// A token equal to the most recently requested context is ignored. If
    /// only a prefix of the token resolves, or the resolved context cannot be
    /// listed, the deepest ancestor that loads is rendered and a warning is
    /// emitted.
    pub async fn restore(&self, token: &str) -> Result<Transition> {
        let token = token.strip_prefix('#').unwrap_or(token).to_string();

        let generation = {
            let mut state = self.lock();
            if state.closed {
                return Err(ChooserError::SessionClosed);
            }
            if state.last_token.as_deref() == Some(token.as_str()) {
                debug!(token = %token, "Token already applied");
                return Ok(Transition::Unchanged);
            }
            state.last_token = Some(token.clone());
            state.generation += 1;
            state.generation
        };
        info!(token = %token, generation, "Restoring context");

        let (ctx, recovered) = match codec::decode(&token, &self.catalog).await {
            Ok(ctx) => (ctx, None),
            Err(failure) => {
                if !self.is_current(generation) {
                    return Ok(Transition::Superseded);
                }
                warn!(token = %token, error = %failure.error, "Token only partly restored");
                self.notice(NoticeLevel::Warning, failure.error.to_string());
                (failure.resolved, Some(failure.error))
            }
        };

        // A context that resolved but cannot be listed falls back to the
        // nearest ancestor that can
        let mut recovered = recovered;
        let mut target = ctx;
        loop {
            match self.load(&target).await {
                Ok((ctx, listing)) => {
                    return Ok(match (self.apply(generation, ctx, listing), recovered) {
                        (Transition::Rendered { generation }, Some(error)) => {
                            Transition::Recovered { generation, error }
                        }
                        (transition, _) => transition,
                    });
                }
                Err(e) => {
                    if !self.is_current(generation) {
                        return Ok(Transition::Superseded);
                    }
                    let Some(parent) = target.parent() else {
                        return self.fail(generation, e);
                    };
                    warn!(
                        token = %target.token(),
                        error = %e,
                        "Restored context could not be loaded"
                    );
                    self.notice(NoticeLevel::Warning, e.to_string());
                    recovered.get_or_insert(e);
                    target = parent;
                }
            }
        }
    }

    // =========================================================================
    // User transitions
    // =========================================================================

    /// Open a location folder from the root listing
    pub async fn open_location(&self, location: hdx_client::Location) -> Result<Transition> {
        let target = self.target(|current| current.enter_location(location))?;
        self.navigate(target).await
    }

    /// Open a tag folder inside the current location
    pub async fn open_tag(&self, tag: hdx_client::Tag) -> Result<Transition> {
        let target = self.target(|current| current.enter_tag(tag))?;
        self.navigate(target).await
    }

    /// Open a dataset from a tag listing or search results
    pub async fn open_dataset(&self, dataset: hdx_client::Dataset) -> Result<Transition> {
        let target = self.target(|current| current.enter_dataset(dataset))?;
        self.navigate(target).await
    }

    /// Run a free-text search, replacing the context from any state
    pub async fn search(&self, query: &str) -> Result<Transition> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Transition::Unchanged);
        }
        let target = self.target(|_| Ok(NavigationContext::search(query)))?;
        self.navigate(target).await
    }

    /// Move to the enclosing context (the previous breadcrumb)
    pub async fn up(&self) -> Result<Transition> {
        let parent = {
            let state = self.lock();
            if state.closed {
                return Err(ChooserError::SessionClosed);
            }
            state.current.parent()
        };
        match parent {
            Some(parent) => self.navigate(parent).await,
            None => Ok(Transition::Unchanged),
        }
    }

    /// Select item `index` (zero-based) of the listing on screen
    pub async fn select(&self, index: usize) -> Result<Transition> {
        let listing = {
            let state = self.lock();
            if state.closed {
                return Err(ChooserError::SessionClosed);
            }
            state.listing.clone()
        };
        let Some(listing) = listing else {
            return Err(self.reject(ChooserError::InvalidTransition(
                "nothing is displayed yet".to_string(),
            )));
        };
        if index >= listing.len() {
            return Err(self.reject(ChooserError::InvalidTransition(format!(
                "no item {} (listing has {})",
                index + 1,
                listing.len()
            ))));
        }

        match listing {
            Listing::Locations(mut items) => self.open_location(items.swap_remove(index)).await,
            Listing::Tags(mut items) => self.open_tag(items.swap_remove(index).tag).await,
            Listing::Datasets(mut results) => {
                self.open_dataset(results.results.swap_remove(index)).await
            }
            Listing::Resources(mut items) => {
                self.select_resource(items.swap_remove(index))?;
                Ok(Transition::Unchanged)
            }
        }
    }

    // =========================================================================
    // Hand-off
    // =========================================================================

    /// Hand a resource of the current dataset to whoever opened the chooser.
    ///
    /// With an opener the resource is delivered once and the session closes.
    /// Without one, the front end is told to navigate to the download URL.
    pub fn select_resource(&self, resource: Resource) -> Result<Selected> {
        let mut state = self.lock();
        if state.closed {
            return Err(ChooserError::SessionClosed);
        }
        if !matches!(state.current.state(), ChooserState::AtDataset(_)) {
            drop(state);
            return Err(self.reject(ChooserError::InvalidTransition(
                "resources can only be selected inside a dataset".to_string(),
            )));
        }

        match state.handoff.take() {
            Some(HandoffMode::Opener(sender)) => {
                state.closed = true;
                sender.deliver(resource);
                self.emit(NavigationEvent::Closed(CloseReason::Delivered));
                Ok(Selected::Delivered)
            }
            other => {
                state.handoff = other;
                let url = resource.url;
                info!(url = %url, "Opening resource");
                self.emit(NavigationEvent::OpenUrl(url.clone()));
                Ok(Selected::OpenedUrl(url))
            }
        }
    }

    /// Close the chooser without a selection. The opener sees cancellation.
    pub fn cancel(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        // Dropping the sender is what the opener observes
        state.handoff = None;
        info!("Chooser cancelled");
        self.emit(NavigationEvent::Closed(CloseReason::Cancelled));
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: NavigationEvent) {
        if self.events.send(event).is_err() {
            debug!("Navigation event dropped: no front end listening");
        }
    }

    fn notice(&self, level: NoticeLevel, message: String) {
        self.emit(NavigationEvent::Notice { level, message });
    }

    /// Emit an error notice for a rejected request and hand the error back
    fn reject(&self, error: ChooserError) -> ChooserError {
        warn!(error = %error, "Navigation rejected");
        self.notice(NoticeLevel::Error, error.to_string());
        error
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.lock();
        !state.closed && state.generation == generation
    }

    /// Compute a transition target from the current context
    fn target<F>(&self, from_current: F) -> Result<NavigationContext>
    where
        F: FnOnce(&NavigationContext) -> Result<NavigationContext>,
    {
        let result = {
            let state = self.lock();
            if state.closed {
                return Err(ChooserError::SessionClosed);
            }
            from_current(&state.current)
        };
        result.map_err(|e| self.reject(e))
    }

    /// Load and apply a user-selected context. On failure the previous
    /// context stays on screen.
    async fn navigate(&self, target: NavigationContext) -> Result<Transition> {
        let generation = {
            let mut state = self.lock();
            if state.closed {
                return Err(ChooserError::SessionClosed);
            }
            // A restore of the token on screen must not be mistaken for a
            // no-op while this navigation is pending
            state.last_token = Some(target.token());
            state.generation += 1;
            state.generation
        };
        debug!(token = %target.token(), generation, "Navigating");

        match self.load(&target).await {
            Ok((ctx, listing)) => Ok(self.apply(generation, ctx, listing)),
            Err(e) => self.fail(generation, e),
        }
    }

    /// Issue the calls needed to display `ctx`.
    ///
    /// Dataset contexts come back with the fully fetched dataset in place of
    /// whatever summary they were built from.
    async fn load(&self, ctx: &NavigationContext) -> Result<(NavigationContext, Listing)> {
        let catalog = &self.catalog;
        let loaded = match ctx {
            NavigationContext::Root => {
                (ctx.clone(), Listing::Locations(catalog.list_locations().await?))
            }
            NavigationContext::Location { location } => (
                ctx.clone(),
                Listing::Tags(catalog.location_tags(&location.name).await?),
            ),
            NavigationContext::LocationTag { location, tag } => (
                ctx.clone(),
                Listing::Datasets(
                    catalog
                        .location_tag_datasets(&location.name, &tag.name)
                        .await?,
                ),
            ),
            NavigationContext::Search { query } => {
                (ctx.clone(), Listing::Datasets(catalog.search(query).await?))
            }
            NavigationContext::LocationDataset {
                location,
                tag,
                dataset,
            } => {
                let dataset = catalog.get_dataset(&dataset.name).await?;
                let listing = Listing::Resources(dataset.resources.clone());
                let ctx = NavigationContext::LocationDataset {
                    location: location.clone(),
                    tag: tag.clone(),
                    dataset,
                };
                (ctx, listing)
            }
            NavigationContext::SearchDataset { query, dataset } => {
                let dataset = catalog.get_dataset(&dataset.name).await?;
                let listing = Listing::Resources(dataset.resources.clone());
                let ctx = NavigationContext::SearchDataset {
                    query: query.clone(),
                    dataset,
                };
                (ctx, listing)
            }
        };
        Ok(loaded)
    }

    /// Replace the context and emit its render, unless superseded
    fn apply(&self, generation: u64, ctx: NavigationContext, listing: Listing) -> Transition {
        let mut state = self.lock();
        if state.closed || state.generation != generation {
            debug!(generation, current = state.generation, "Discarding stale result");
            return Transition::Superseded;
        }

        let render = RenderRequest::build(generation, &ctx, listing.clone(), self.catalog.base_url());
        state.last_token = Some(render.token.clone());
        state.rendered_token = Some(render.token.clone());
        state.current = ctx;
        state.listing = Some(listing);
        self.emit(NavigationEvent::Render(render));

        Transition::Rendered { generation }
    }

    /// Report a failed load, keeping the previous context
    fn fail(&self, generation: u64, error: ChooserError) -> Result<Transition> {
        {
            let mut state = self.lock();
            if state.closed || state.generation != generation {
                return Ok(Transition::Superseded);
            }
            // Let the same token be retried
            state.last_token = state.rendered_token.clone();
        }
        Err(self.reject(error))
    }
}
