//! User profile API.

use qryti_core::types::UserProfile;

use super::decode;
use crate::client::{ApiClient, RequestOptions};
use crate::ClientResult;

/// Profile API client.
pub struct ProfileApi {
    client: ApiClient,
}

impl ProfileApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the signed-in user's profile.
    pub async fn get(&self) -> ClientResult<UserProfile> {
        let endpoint = &self.client.config().endpoints.profile;
        decode(self.client.get(endpoint, RequestOptions::new()).await?)
    }

    /// Update the profile and refresh the stored copy with the result.
    pub async fn update(&self, profile: &UserProfile) -> ClientResult<UserProfile> {
        let endpoint = &self.client.config().endpoints.profile;
        let updated: UserProfile =
            decode(self.client.put(endpoint, profile, RequestOptions::new()).await?)?;
        self.client.store_user(updated.clone()).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::test_support::client_for;

    #[tokio::test]
    async fn test_get_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/users/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "id": 42, "email": "ada@example.com", "name": "Ada", "team": "risk" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let profile = client.profile().get().await.unwrap();

        assert_eq!(profile.id.as_deref(), Some("42"));
        assert_eq!(profile.display_name(), "Ada");
        assert_eq!(profile.extra.get("team"), Some(&json!("risk")));
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_session_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "t",
                "user": { "email": "ada@example.com", "name": "Ada" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/users/profile"))
            .and(body_json(json!({ "email": "ada@example.com", "name": "Ada Lovelace" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "email": "ada@example.com", "name": "Ada Lovelace" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.login("ada@example.com", "secret").await.unwrap();

        let mut profile = client.user().unwrap();
        profile.name = Some("Ada Lovelace".to_string());
        let updated = client.profile().update(&profile).await.unwrap();

        assert_eq!(updated.display_name(), "Ada Lovelace");
        assert_eq!(client.user().unwrap().display_name(), "Ada Lovelace");
        assert_eq!(client.token().as_deref(), Some("t"));
    }
}
