// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, social graph, journey flag)
//! - Spots (audio stories and their lookups)
//! - Journeys (active and past excursions)
//! - Badges (per-user scores)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Badge, Journey, Spot, User};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 20;

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(username)
            .await
            .map_err(db_err)
    }

    /// Create a user; fails with `Conflict` if the username is taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _: User = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.username)
            .object(user)
            .execute()
            .await
            .map_err(|e| match e {
                firestore::errors::FirestoreError::DataConflictError(_) => {
                    AppError::Conflict(format!("Username '{}' is already taken", user.username))
                }
                other => db_err(other),
            })?;
        Ok(())
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.username)
            .object(user)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// All users whose home resolved to `area_name`.
    pub async fn get_users_in_area(&self, area_name: &str) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("area_name").eq(area_name)]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Write a follower/followee pair in one transaction.
    pub async fn set_users_atomic(&self, first: &User, second: &User) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for user in [first, second] {
            client
                .fluent()
                .update()
                .in_col(collections::USERS)
                .document_id(&user.username)
                .object(user)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add user to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    // ─── Spot Operations ─────────────────────────────────────────

    pub async fn get_spot(&self, spot_id: &str) -> Result<Option<Spot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SPOTS)
            .obj()
            .one(spot_id)
            .await
            .map_err(db_err)
    }

    /// Create or overwrite a spot.
    pub async fn set_spot(&self, spot: &Spot) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SPOTS)
            .document_id(&spot.id)
            .object(spot)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    pub async fn delete_spot(&self, spot_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SPOTS)
            .document_id(spot_id)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    pub async fn get_spots_for_user(&self, username: &str) -> Result<Vec<Spot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SPOTS)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    pub async fn get_spots_in_category(&self, category: &str) -> Result<Vec<Spot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SPOTS)
            .filter(|q| q.for_all([q.field("category").eq(category)]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Spots with latitude in `[min_lat, max_lat]`.
    ///
    /// Firestore allows range filters on one field without a composite
    /// index, so longitude is left to the caller.
    pub async fn get_spots_in_latitude_band(
        &self,
        min_lat: f64,
        max_lat: f64,
    ) -> Result<Vec<Spot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SPOTS)
            .filter(move |q| {
                q.for_all([
                    q.field("latitude").greater_than_or_equal(min_lat),
                    q.field("latitude").less_than_or_equal(max_lat),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// First spot owned by `username` at the given coordinates.
    pub async fn find_spot_at(
        &self,
        username: &str,
        lat: f64,
        lon: f64,
    ) -> Result<Option<Spot>, AppError> {
        let spots = self.get_spots_for_user(username).await?;
        Ok(spots.into_iter().find(|s| s.is_at(lat, lon)))
    }

    /// Increment a spot's view count and return the new value.
    ///
    /// Read-modify-write; concurrent viewers may undercount.
    pub async fn increment_view_count(&self, spot: &Spot) -> Result<u64, AppError> {
        let mut updated = spot.clone();
        updated.viewcount = updated.viewcount.saturating_add(1);
        self.set_spot(&updated).await?;
        Ok(updated.viewcount)
    }

    /// Recount a user's spots and store the result on the user row.
    pub async fn refresh_post_count(&self, username: &str) -> Result<u32, AppError> {
        let count = self.get_spots_for_user(username).await?.len() as u32;

        match self.get_user(username).await? {
            Some(mut user) => {
                user.postcount = count;
                self.upsert_user(&user).await?;
            }
            None => {
                tracing::warn!(username, "Post count refresh for unknown user");
            }
        }

        Ok(count)
    }

    // ─── Badge Operations ────────────────────────────────────────

    pub async fn get_badge(&self, username: &str) -> Result<Option<Badge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::BADGES)
            .obj()
            .one(username)
            .await
            .map_err(db_err)
    }

    pub async fn set_badge(&self, badge: &Badge) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::BADGES)
            .document_id(&badge.username)
            .object(badge)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Add the per-spot award to a user's badge; returns the new score.
    pub async fn award_spot_badge(&self, username: &str) -> Result<u32, AppError> {
        let badge = Badge::award(self.get_badge(username).await?, username);
        self.set_badge(&badge).await?;
        Ok(badge.scores)
    }

    /// Badges for the given users; users without a badge are skipped.
    pub async fn get_badges_for(&self, usernames: &[String]) -> Result<Vec<Badge>, AppError> {
        stream::iter(usernames.iter().cloned())
            .map(|username| async move { self.get_badge(&username).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Badge>, AppError>>>()
            .await
            .into_iter()
            .filter_map(Result::transpose)
            .collect()
    }

    // ─── Journey Operations ──────────────────────────────────────

    /// The user's in-progress journey, if any.
    pub async fn get_active_journey(&self, username: &str) -> Result<Option<Journey>, AppError> {
        let journeys: Vec<Journey> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::JOURNEYS)
            .filter(|q| {
                q.for_all([
                    q.field("username").eq(username),
                    q.field("status").eq(true),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_err)?;
        Ok(journeys.into_iter().next())
    }

    /// All journeys of a user, oldest first.
    pub async fn get_journeys_for_user(&self, username: &str) -> Result<Vec<Journey>, AppError> {
        let mut journeys: Vec<Journey> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::JOURNEYS)
            .filter(|q| q.for_all([q.field("username").eq(username)]))
            .obj()
            .query()
            .await
            .map_err(db_err)?;
        // Sorted here to avoid a composite index on (username, created_at)
        journeys.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(journeys)
    }

    pub async fn get_journey_by_name(
        &self,
        username: &str,
        journeyname: &str,
    ) -> Result<Option<Journey>, AppError> {
        let journeys: Vec<Journey> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::JOURNEYS)
            .filter(|q| {
                q.for_all([
                    q.field("username").eq(username),
                    q.field("journeyname").eq(journeyname),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_err)?;
        Ok(journeys.into_iter().next())
    }

    pub async fn set_journey(&self, journey: &Journey) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::JOURNEYS)
            .document_id(&journey.id)
            .object(journey)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Write a journey and its owner's journey flag together.
    ///
    /// Used for both starting and ending a journey so the user flag and
    /// the journey status never disagree.
    pub async fn set_journey_and_user_atomic(
        &self,
        journey: &Journey,
        user: &User,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::JOURNEYS)
            .document_id(&journey.id)
            .object(journey)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add journey to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.username)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            username = %user.username,
            journey_id = %journey.id,
            active = journey.status,
            "Journey state committed"
        );

        Ok(())
    }
}
