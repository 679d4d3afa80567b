// Document Composer: editable drafts held in memory, rendered to PDF on demand.
// Drafts are edited through the store; rendering takes a snapshot and runs off
// the async executor.

pub mod draft;
pub mod handlers;
pub mod render;
pub mod store;

pub use draft::DraftError;
pub use render::ComposeError;
pub use store::DraftStore;
