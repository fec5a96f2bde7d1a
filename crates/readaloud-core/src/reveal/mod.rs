//! Progressive reveal ("typewriter") system
//!
//! A single incremental revealer exposes a growing prefix of a text on a
//! fixed interval. It is parameterised by token granularity so the same
//! machinery animates document body text (words) and the status caption
//! (characters).
//!
//! # Architecture
//!
//! ## L4 Atomic Layer
//! - `tokens` - Token boundary computation (word / character)
//! - `timing` - Interval arithmetic for due ticks
//!
//! ## L3 Molecular Layer
//! - `revealer` - Timer-driven prefix revealer combining atoms
//!
//! ## L2 Component Layer
//! - `scheduler` - Body text reveal (words, 40 ms)
//! - `status_label` - Status caption animation (characters, 70 ms)
//!
//! # Usage
//!
//! ```ignore
//! use readaloud_core::reveal::{RevealEvent, RevealScheduler};
//!
//! let mut scheduler = RevealScheduler::with_defaults();
//! scheduler.start("a b c".into(), Instant::now());
//!
//! // In main loop, poll with the current time
//! for event in scheduler.update(Instant::now()) {
//!     if let RevealEvent::Tick(frame) = event {
//!         draw(frame.prefix());
//!     }
//! }
//! ```

// L4 Atomic Layer
pub mod timing;
pub mod tokens;

// L3 Molecular Layer
pub mod revealer;

// L2 Component Layer
pub mod scheduler;
pub mod status_label;

pub use revealer::{Generation, IncrementalRevealer, RevealFrame};
pub use scheduler::{RevealEvent, RevealScheduler, RevealState};
pub use status_label::{LabelState, StatusLabelAnimator};
pub use tokens::Granularity;
