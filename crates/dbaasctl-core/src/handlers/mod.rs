//! Resource handlers
//!
//! One handler per remote resource, each method one control-plane call with its
//! status contract enforced. Handlers are cheap to construct from an authorized
//! [`DbaasClient`](crate::client::DbaasClient).

pub mod clusters;
pub mod databases;
pub mod dumps;
pub mod users;

pub use clusters::ClusterHandler;
pub use databases::DatabaseHandler;
pub use dumps::DumpHandler;
pub use users::UserHandler;
