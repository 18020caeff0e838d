pub mod catalog;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod export;
pub mod lock;
pub mod reconcile;
pub mod session;
pub mod time;

pub use catalog::SectionCatalog;
pub use collaborator::{
    CollaboratorError, Finding, FindingKind, RewriteCollaborator, RewriteReply, RewriteRequest,
};
pub use config::SessionConfig;
pub use error::SessionError;
pub use export::ExportArtifact;
pub use lock::LockPolicy;
pub use reconcile::{EditOrigin, SectionMeta, reconcile};
pub use session::{Change, DocumentSnapshot, RewriteOutcome, Session};
pub use time::Timestamp;
