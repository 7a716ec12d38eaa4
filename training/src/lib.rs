//! Persistence for trainable models offered through the marketplace.
//!
//! Four record families share one [`AtomicStore`](marketd_store::AtomicStore),
//! each under its own key prefix:
//! - [`ModelStore`]: one [`ModelData`] per (org, service, group, model id)
//! - [`ModelUserStore`]: the model ids each user address can access
//! - [`PendingModelStore`]: model ids still validating or training
//! - [`PublicModelStore`]: model ids visible to everyone
//!
//! The id lists are deduplicated sets kept in a single record and updated
//! through CAS transactions, so concurrent writers never lose an id.
//! [`TrainingStorage`] ties the four together.

pub mod error;
pub mod membership;
pub mod model;
pub mod model_user;
pub mod pending;
pub mod public;
pub mod status;
pub mod storage;

pub use error::TrainingError;
pub use membership::ModelIdSet;
pub use model::{ModelData, ModelKey, ModelStore, ModelUpdate};
pub use model_user::{ModelUserData, ModelUserKey, ModelUserStore};
pub use pending::{PendingModelData, PendingModelKey, PendingModelStore};
pub use public::{PublicModelData, PublicModelKey, PublicModelStore};
pub use status::Status;
pub use storage::TrainingStorage;
