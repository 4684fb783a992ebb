pub use crate::app::App;
pub use gateward_types::error::{Error, GwResult};
pub use gateward_types::types::{ClientKey, SubjectId, Timestamp};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
