use surrealdb::sql::Thing;
use uuid::Uuid;

use crate::prelude::*;

pub type UserId = Thing;

pub fn new_user_id() -> UserId {
    user_id(Uuid::new_v4())
}

pub fn user_id(uuid: Uuid) -> UserId {
    ("users".to_string(), uuid.simple().to_string()).into()
}

/// An account on the admin surface. The password never leaves the
/// database; hashing and comparison happen in SurrealQL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct User {
    #[new(value = "new_user_id()")]
    pub id: UserId,
    #[new(value = "now()")]
    pub created_at: Timestamp,

    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
}
