//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Keyed by username
    pub const USERS: &str = "users";
    pub const SPOTS: &str = "spots";
    pub const JOURNEYS: &str = "journeys";
    /// Keyed by username
    pub const BADGES: &str = "badges";
}
