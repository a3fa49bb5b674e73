pub mod diag;
pub mod event;
pub mod filter;
pub mod join;
pub mod window;

pub use diag::{Diagnostic, Diagnostics, Severity};
pub use event::{ForgeEvent, ForgePayload, RawForgeEvent, TrackerEvent};
pub use filter::{KindClass, KindFilter};
pub use join::{collapse_consecutive, oxford_join};
pub use window::{prune, ReportWindow, Timestamped, WindowError};
