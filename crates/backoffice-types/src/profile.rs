//! User profile types.

use serde::{Deserialize, Serialize};

/// Profile of an authenticated user. Requests are scoped to its company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
	/// User id issued by the authentication provider.
	pub id: String,
	/// Display name, used as the author of order notes.
	pub name: String,
	pub company_id: String,
}
