//! Transport control surface
//!
//! - [`input`]: tagged input events (hold pulses, drags, taps)
//! - [`scan`]: directional-seek acceleration state machine
//! - [`refresh`]: adaptive position refresh scheduling
//! - [`pager`]: queue paging window

pub mod input;
pub mod pager;
pub mod refresh;
pub mod scan;

pub use input::{DragEvent, InputPulse, InputSource, ScrollState, SeekDirection, TapControl};
pub use pager::QueueCursor;
pub use refresh::{PositionScheduler, RefreshPlan};
pub use scan::{PulseEffect, SeekAccelerator};
