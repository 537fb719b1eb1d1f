pub mod error;
pub mod events;
pub mod module;
pub mod org;
pub mod store;
pub mod types;

pub use error::ServiceError;
pub use events::{EventSink, MemorySink, NullSink};
pub use module::Module;
pub use org::{ORG_HEADER, OrgId};
pub use types::{ListParams, ListResult, merge_patch, new_id, now_rfc3339};
