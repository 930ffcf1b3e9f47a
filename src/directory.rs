//! Employee-directory calls built on the session manager's request wrapper.
//!
//! This is where the stale-credential policy lives: every directory call
//! that comes back 401 forces a logout before surfacing the error, so a
//! consumer that sees `ApiError::Unauthorized` can route straight to the
//! unauthenticated entry point.

use tracing::warn;

use crate::api::{ApiError, AuthClient};
use crate::auth::SessionManager;
use crate::models::{Employee, EmployeeUpdate, NewEmployee};

pub struct Directory {
    session: SessionManager,
}

impl Directory {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// List employees, optionally filtered by a name/department substring.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Employee>, ApiError> {
        let mut builder = self.session.http().get(self.session.endpoint("/api/employees"));
        if let Some(q) = search {
            builder = builder.query(&[("search", q)]);
        }
        let response = self.session.request(builder).await?;
        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Bad employee list: {}", e)))
    }

    /// Create an employee record; returns it as the server stored it.
    pub async fn add(&self, employee: &NewEmployee) -> Result<Employee, ApiError> {
        let builder = self
            .session
            .http()
            .post(self.session.endpoint("/api/employees"))
            .json(employee);
        let response = self.session.request(builder).await?;
        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Bad employee body: {}", e)))
    }

    /// Update name and/or department of an existing record.
    pub async fn update(&self, id: i64, update: &EmployeeUpdate) -> Result<Employee, ApiError> {
        let builder = self
            .session
            .http()
            .put(self.session.endpoint(&format!("/api/employees/{}", id)))
            .json(update);
        let response = self.session.request(builder).await?;
        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Bad employee body: {}", e)))
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        let builder = self
            .session
            .http()
            .delete(self.session.endpoint(&format!("/api/employees/{}", id)));
        let response = self.session.request(builder).await?;
        self.check(response).await?;
        Ok(())
    }

    /// Status check shared by all directory calls. A 401 means the held
    /// credential is stale or revoked: drop the session, then report it.
    /// A 403 is an authorization refusal for a live session and surfaces as
    /// `AccessDenied` without touching the credential.
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().as_u16() == 401 {
            warn!("directory call rejected with 401, forcing logout");
            self.session.logout();
            return Err(ApiError::Unauthorized);
        }
        AuthClient::check_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    async fn authenticated_directory(server: &mut mockito::ServerGuard) -> Directory {
        let _login = server
            .mock("POST", "/api/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "tok123", "expires_in": 3600}"#)
            .create_async()
            .await;

        let client = AuthClient::new(&server.url()).expect("client");
        let session = SessionManager::new(client, Arc::new(MemoryStore::new()));
        assert!(session.login("alice", "correct").await);
        Directory::new(session)
    }

    #[tokio::test]
    async fn test_list_parses_employees() {
        let mut server = mockito::Server::new_async().await;
        let directory = authenticated_directory(&mut server).await;
        let _list = server
            .mock("GET", "/api/employees")
            .match_header("authorization", "Bearer tok123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id": 1, "name": "Dana Smith", "department": "Engineering",
                     "created_by": 1, "created_at": "2026-08-01T12:00:00"}]"#,
            )
            .create_async()
            .await;

        let employees = directory.list(None).await.expect("list");
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].name, "Dana Smith");
    }

    #[tokio::test]
    async fn test_list_passes_search_query() {
        let mut server = mockito::Server::new_async().await;
        let directory = authenticated_directory(&mut server).await;
        let mock = server
            .mock("GET", "/api/employees")
            .match_query(mockito::Matcher::UrlEncoded(
                "search".into(),
                "eng".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let employees = directory.list(Some("eng")).await.expect("list");
        assert!(employees.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_posts_new_employee() {
        let mut server = mockito::Server::new_async().await;
        let directory = authenticated_directory(&mut server).await;
        let mock = server
            .mock("POST", "/api/employees")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "name": "Lee Park",
                "department": "Sales"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 2, "name": "Lee Park", "department": "Sales",
                    "created_by": 1, "created_at": "2026-08-29T09:00:00"}"#,
            )
            .create_async()
            .await;

        let created = directory
            .add(&NewEmployee {
                name: "Lee Park".to_string(),
                department: "Sales".to_string(),
            })
            .await
            .expect("add");
        assert_eq!(created.id, 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_puts_only_changed_fields() {
        let mut server = mockito::Server::new_async().await;
        let directory = authenticated_directory(&mut server).await;
        let mock = server
            .mock("PUT", "/api/employees/7")
            .match_header("authorization", "Bearer tok123")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "department": "Sales"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 7, "name": "Dana Smith", "department": "Sales",
                    "created_by": 1, "created_at": "2026-08-01T12:00:00"}"#,
            )
            .create_async()
            .await;

        let updated = directory
            .update(
                7,
                &EmployeeUpdate {
                    department: Some("Sales".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.department, "Sales");
        assert_eq!(updated.name, "Dana Smith");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remove_deletes_employee() {
        let mut server = mockito::Server::new_async().await;
        let directory = authenticated_directory(&mut server).await;
        let mock = server
            .mock("DELETE", "/api/employees/7")
            .match_header("authorization", "Bearer tok123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"msg": "deleted"}"#)
            .create_async()
            .await;

        directory.remove(7).await.expect("remove");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forbidden_response_keeps_session_alive() {
        let mut server = mockito::Server::new_async().await;
        let directory = authenticated_directory(&mut server).await;
        let _list = server
            .mock("GET", "/api/employees")
            .with_status(403)
            .with_body("not allowed")
            .create_async()
            .await;

        let err = directory.list(None).await.unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));
        assert!(directory.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthorized_response_forces_logout() {
        let mut server = mockito::Server::new_async().await;
        let directory = authenticated_directory(&mut server).await;
        let _list = server
            .mock("GET", "/api/employees")
            .with_status(401)
            .create_async()
            .await;

        let err = directory.list(None).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!directory.session().is_authenticated());
        assert_eq!(directory.session().credential(), None);
    }
}
