use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::auth::Identity;

/// WhoAmI
///
/// Response of `GET /auth/whoami`: the identity the gateway resolved for the
/// caller's token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct WhoAmI {
    pub username: String,
    // Sorted, as held by the identity.
    pub groups: Vec<String>,
}

impl From<Identity> for WhoAmI {
    fn from(identity: Identity) -> Self {
        Self {
            username: identity.username,
            groups: identity.groups.into_iter().collect(),
        }
    }
}
