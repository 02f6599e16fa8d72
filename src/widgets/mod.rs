//! Client-side widget state machines. Rendering is left to the page; these
//! types own the state and produce the strings the page displays.

pub mod annotations;
pub mod comments;
pub mod feeds;
pub mod lab_chat;
pub mod metrics;

pub use annotations::{Annotation, AnnotationView, Annotations};
pub use comments::{CommentRow, CommentWidget, LocalReport, SeedComment};
pub use feeds::{EmailFeeds, FeedPrefs, FeedSubscription};
pub use lab_chat::{ChatMessage, LabChat};
pub use metrics::{Gauge, MetricsPanel};
