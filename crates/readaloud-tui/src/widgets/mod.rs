mod caption;
mod document;
mod narration_bar;

pub use caption::CaptionWidget;
pub use document::DocumentWidget;
pub use narration_bar::{HelpBarWidget, NarrationBarWidget};
