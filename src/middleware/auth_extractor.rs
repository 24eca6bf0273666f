// src/middleware/auth_extractor.rs - bearer token -> Firebase uid
//
// Auth itself is an external collaborator; this extractor only pulls the
// owner uid out of the Firebase ID token payload. Signature verification
// happens upstream (Firebase security rules) - the uid here scopes queries,
// it is not a trust boundary.
use actix_web::error::ErrorUnauthorized;
use actix_web::{dev::Payload, Error, FromRequest, HttpRequest};
use base64::Engine;
use futures::future::{ready, Ready};

/// The authenticated owner of the request.
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<AuthenticatedUser, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_header = match req.headers().get("Authorization") {
            Some(header) => match header.to_str() {
                Ok(h) => h,
                Err(_) => return ready(Err(ErrorUnauthorized("Invalid header format"))),
            },
            None => return ready(Err(ErrorUnauthorized("Missing Authorization header"))),
        };

        if !auth_header.starts_with("Bearer ") {
            return ready(Err(ErrorUnauthorized("Invalid auth header format")));
        }

        let token = auth_header.trim_start_matches("Bearer ").trim();

        match extract_uid_from_token(token) {
            Ok(user_id) => ready(Ok(AuthenticatedUser { user_id })),
            Err(e) => {
                println!("Auth failed: {}", e);
                ready(Err(ErrorUnauthorized("Invalid token")))
            }
        }
    }
}

/// Pull the uid claim out of a Firebase ID token (JWT) payload.
fn extract_uid_from_token(token: &str) -> Result<String, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid JWT format".to_string());
    }

    // JWT payloads are base64url without padding; some clients send
    // standard base64, so fall back to that.
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(parts[1]))
        .map_err(|e| format!("Base64 decode failed: {}", e))?;

    let payload = String::from_utf8(decoded).map_err(|e| format!("UTF8 error: {}", e))?;
    let json: serde_json::Value =
        serde_json::from_str(&payload).map_err(|e| format!("JSON parse error: {}", e))?;

    // Firebase ID tokens carry the uid in `user_id`, with `sub` as alias.
    json.get("user_id")
        .or_else(|| json.get("sub"))
        .and_then(|v| v.as_str())
        .filter(|uid| !uid.is_empty())
        .map(|uid| uid.to_string())
        .ok_or_else(|| "Missing uid claim in token".to_string())
}
