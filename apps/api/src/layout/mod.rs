// Page layout: font metrics, sheet geometry, word wrap and the per-page planner.
// Everything here is pure and synchronous; the composer runs it on a blocking thread.

pub mod font_metrics;
pub mod page;
pub mod planner;
pub mod wrap;

// Re-export the public API consumed by the composer.
pub use font_metrics::{FontFamily, FontStyle};
pub use page::{DocumentConfig, SheetSize};
pub use planner::{plan_page, ImageSize, PagePlan};
