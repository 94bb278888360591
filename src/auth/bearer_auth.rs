use std::fmt;

use http::header;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::{
    core::{IntegratorError, Request},
    utils::request,
};

use super::OAUTH;

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct Credentials {
    #[validate(length(min = 1))]
    token: String,
}

/// OAuth bearer token authentication.
///
/// The token is a static credential; refreshing it is the credential
/// source's job.
#[derive(Clone)]
pub struct BearerAuth {
    credentials: Credentials,
}

impl TryFrom<JsonValue> for BearerAuth {
    type Error = IntegratorError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        let credentials = super::parse_credentials(OAUTH, value)?;
        Ok(Self { credentials })
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl BearerAuth {
    pub(super) fn apply(&self, req: &mut Request) {
        request::set_header(
            &mut req.headers,
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", self.credentials.token),
        );
    }
}
