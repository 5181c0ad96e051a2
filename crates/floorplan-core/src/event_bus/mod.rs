//! # Event Bus Module
//!
//! Application-wide publish/subscribe channel used by the engine to report
//! what happened at its asynchronous boundaries.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by category and receive events of interest
//! - Failures that the user should see travel as `AppEvent::Notification`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use floorplan_core::event_bus::{event_bus, AppEvent, EventCategory, EventFilter};
//!
//! let subscription = event_bus().subscribe(
//!     EventFilter::Categories(vec![EventCategory::Notification]),
//!     |event| {
//!         if let AppEvent::Notification(note) = event {
//!             eprintln!("{}", note.message);
//!         }
//!     },
//! );
//!
//! event_bus().unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
