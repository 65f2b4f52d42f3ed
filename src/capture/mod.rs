//! Behavioral event capture.
//!
//! Each input class has its own adapter: a pairing state machine owned by
//! the thread that drives it, publishing immutable [`RawEvent`]s through a
//! single-writer channel into the event store. Nothing here ever blocks on
//! storage.

pub mod focus;
pub mod hooks;
pub mod keyboard;
pub mod mouse;
pub mod resource;
pub mod types;

// Re-export commonly used types
pub use focus::{FocusTracker, NoopWindowProbe, WindowProbe};
pub use hooks::{check_permission, EventPublisher, HookError, InputAdapter, InputHooks};
pub use keyboard::KeyboardTracker;
pub use mouse::{ClickTracker, ScrollTracker};
pub use resource::ResourceSampler;
pub use types::{EventKind, EventType, RawEvent, ScrollDirection};
