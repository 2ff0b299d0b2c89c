//! Navigation state machine and the render requests it emits

pub mod render;
pub mod service;

pub use render::{Breadcrumb, Listing, OverviewFact, RenderRequest};
pub use service::{
    CloseReason, NavigationEvent, NavigationService, NoticeLevel, Selected, Transition,
};
