//! Maps a raw create-shortcut response onto what the creator should do next.
//!
//! The Fabric API reports "already exists" and "no access to target" as a 400 whose
//! only distinguishing data is the detail message, so those two cases are matched on
//! message text here and nowhere else.

use serde::Deserialize;

use crate::contract::ApiResponse;

/// Detail message OneLake returns when a shortcut with the same name exists.
pub const ALREADY_EXISTS_MESSAGE: &str =
    "Copy, Rename or Update of shortcuts are not supported by OneLake.";

/// Prefix of the detail message for a connection without access to the storage path.
pub const ACCESS_DENIED_MARKER: &str = "Unauthorized. Access to target location";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    /// 200/201; carries the name echoed by the API, if any.
    Created { name: Option<String> },
    /// 429; carries the server's `Retry-After`, if any.
    RateLimited { retry_after_secs: Option<u64> },
    AlreadyExists,
    AccessDenied { message: String },
    Forbidden,
    /// Anything else. Goes down the generic retry path.
    Unexpected { status: u16, detail: String },
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    more_details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// First `moreDetails[].message`, falling back to the top-level `message`.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .more_details
        .into_iter()
        .next()
        .and_then(|d| d.message)
        .or(parsed.message)
}

pub fn classify_response(response: &ApiResponse) -> ResponseClass {
    match response.status {
        200 | 201 => ResponseClass::Created {
            name: serde_json::from_str::<CreatedBody>(&response.body)
                .ok()
                .and_then(|b| b.name),
        },
        429 => ResponseClass::RateLimited {
            retry_after_secs: response.retry_after_secs,
        },
        400 => match error_message(&response.body) {
            Some(msg) if msg == ALREADY_EXISTS_MESSAGE => ResponseClass::AlreadyExists,
            Some(msg) if msg.contains(ACCESS_DENIED_MARKER) => {
                ResponseClass::AccessDenied { message: msg }
            }
            Some(msg) => ResponseClass::Unexpected {
                status: 400,
                detail: msg,
            },
            None => ResponseClass::Unexpected {
                status: 400,
                detail: response.body.clone(),
            },
        },
        403 => ResponseClass::Forbidden,
        status => ResponseClass::Unexpected {
            status,
            detail: response.body.clone(),
        },
    }
}
