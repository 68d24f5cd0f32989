//! Outbound notifications.
//!
//! - [`delivery`] holds the transport channels (currently a JSON webhook).
//! - [`NotificationSink`] is the fire-and-forget seam the workflow uses to
//!   record a user's email; [`EmailNotifier`] implements it on top of the
//!   webhook channel.

pub mod delivery;
pub mod notifier;

pub use delivery::webhook::{WebhookDelivery, WebhookError};
pub use notifier::{EmailNotifier, NotificationSink};
