//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in Firestore (document ID = username).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique, lower-cased username
    pub username: String,
    /// PBKDF2 password hash (never returned by the API)
    pub password_hash: String,
    /// Profile picture URL
    pub profilepic: Option<String>,
    /// Preferred language code
    #[serde(default = "default_language")]
    pub preferlng: String,
    /// Home coordinates, set once via `/set-home`
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Area name resolved from the home coordinates
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub followers_count: u32,
    #[serde(default)]
    pub following_count: u32,
    /// Number of spots posted
    #[serde(default)]
    pub postcount: u32,
    /// True while a journey is active
    #[serde(default)]
    pub status: bool,
    pub created_at: String,
}

fn default_language() -> String {
    "EN".to_string()
}

impl User {
    /// New user with empty social graph and no home location.
    pub fn new(username: String, password_hash: String, profilepic: Option<String>) -> Self {
        Self {
            username,
            password_hash,
            profilepic,
            preferlng: default_language(),
            latitude: None,
            longitude: None,
            area_name: None,
            followers: Vec::new(),
            following: Vec::new(),
            followers_count: 0,
            following_count: 0,
            postcount: 0,
            status: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn has_home(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Record `follower` as following this user. Returns `false` if already present.
    pub fn add_follower(&mut self, follower: &str) -> bool {
        let added = insert_unique(&mut self.followers, follower);
        self.followers_count = self.followers.len() as u32;
        added
    }

    /// Returns `false` if `follower` was not in the list.
    pub fn remove_follower(&mut self, follower: &str) -> bool {
        let removed = remove_all(&mut self.followers, follower);
        self.followers_count = self.followers.len() as u32;
        removed
    }

    pub fn add_following(&mut self, target: &str) -> bool {
        let added = insert_unique(&mut self.following, target);
        self.following_count = self.following.len() as u32;
        added
    }

    pub fn remove_following(&mut self, target: &str) -> bool {
        let removed = remove_all(&mut self.following, target);
        self.following_count = self.following.len() as u32;
        removed
    }
}

/// User as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicUser {
    pub username: String,
    pub profilepic: Option<String>,
    pub preferlng: String,
    pub area_name: Option<String>,
    pub followers_count: u32,
    pub following_count: u32,
    pub postcount: u32,
    pub created_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            profilepic: user.profilepic.clone(),
            preferlng: user.preferlng.clone(),
            area_name: user.area_name.clone(),
            followers_count: user.followers_count,
            following_count: user.following_count,
            postcount: user.postcount,
            created_at: user.created_at.clone(),
        }
    }
}

fn insert_unique(list: &mut Vec<String>, name: &str) -> bool {
    if list.iter().any(|n| n == name) {
        return false;
    }
    list.push(name.to_string());
    true
}

fn remove_all(list: &mut Vec<String>, name: &str) -> bool {
    let before = list.len();
    list.retain(|n| n != name);
    list.len() != before
}

/// Canonical form of a username as stored and looked up.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}
