//! User profiles.
//!
//! A profile links a user id to a display name and the company whose records
//! the user works with.

use super::{missing_as_not_found, required_text, RecordError};
use backoffice_storage::StorageService;
use backoffice_types::{StorageKey, UserProfile};
use std::sync::Arc;

pub struct ProfileDirectory {
	storage: Arc<StorageService>,
}

impl ProfileDirectory {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, RecordError> {
		self.storage
			.retrieve(StorageKey::Users.as_str(), user_id)
			.await
			.map_err(missing_as_not_found("Profile", user_id))
	}

	/// Creates or replaces a profile.
	pub async fn upsert_profile(&self, profile: UserProfile) -> Result<UserProfile, RecordError> {
		let profile = UserProfile {
			id: required_text("id", &profile.id)?,
			name: required_text("name", &profile.name)?,
			company_id: required_text("company_id", &profile.company_id)?,
		};
		self.storage
			.store(StorageKey::Users.as_str(), &profile.id, &profile)
			.await?;
		Ok(profile)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use backoffice_storage::implementations::memory::MemoryStorage;

	#[tokio::test]
	async fn test_profile_roundtrip_and_missing() {
		let directory =
			ProfileDirectory::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))));

		assert!(matches!(
			directory.get_profile("u1").await,
			Err(RecordError::NotFound { entity: "Profile", .. })
		));

		directory
			.upsert_profile(UserProfile {
				id: "u1".to_string(),
				name: "María".to_string(),
				company_id: "empresa-1".to_string(),
			})
			.await
			.unwrap();
		assert_eq!(directory.get_profile("u1").await.unwrap().company_id, "empresa-1");

		let invalid = directory
			.upsert_profile(UserProfile {
				id: "u2".to_string(),
				name: "Juan".to_string(),
				company_id: "".to_string(),
			})
			.await;
		assert!(matches!(invalid, Err(RecordError::Validation(_))));
	}
}
