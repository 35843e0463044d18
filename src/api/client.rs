use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::{NewUser, Role, User, UserService, UserUpdate};
use crate::error::{ApiError, ApiOp};

/// `UserService` backed by the REST API at a single base URL.
#[derive(Clone, Debug)]
pub struct HttpUserService {
    client: Client,
    base_url: Url,
}

impl HttpUserService {
    /// Build a client for `base_url`. No timeout is applied unless one is given.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        tracing::info!(%base_url, ?timeout, "user service client ready");
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path (e.g. `api/findAll`) against the base URL,
    /// keeping any path prefix the base carries.
    pub fn endpoint(&self, op: ApiOp, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::Endpoint {
                op,
                path: path.to_string(),
                source,
            })
    }

    async fn send(&self, op: ApiOp, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { op, source })?;
        tracing::debug!(%op, status = %response.status(), "user service replied");
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(op: ApiOp, response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { op, source })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl UserService for HttpUserService {
    async fn list_all(&self) -> Result<Vec<User>, ApiError> {
        let op = ApiOp::ListAll;
        let url = self.endpoint(op, "api/findAll")?;
        let response = self.send(op, self.client.get(url)).await?;
        if !response.status().is_success() {
            return Err(ApiError::Rejected {
                op,
                status: response.status(),
            });
        }
        Self::json(op, response).await
    }

    async fn find_by_id(&self, id: u64) -> Result<User, ApiError> {
        let op = ApiOp::FindById;
        let url = self.endpoint(op, "api/findById")?;
        let request = self.client.get(url).query(&[("id", id)]);
        let response = self.send(op, request).await?;
        if !response.status().is_success() {
            return Err(ApiError::NotFound {
                op,
                what: format!("user {id}"),
                status: response.status(),
            });
        }
        Self::json(op, response).await
    }

    async fn find_by_role(&self, role: &Role) -> Result<Vec<String>, ApiError> {
        let op = ApiOp::FindByRole;
        let url = self.endpoint(op, "api/findByRole")?;
        let request = self.client.get(url).query(&[("role", role.name())]);
        let response = self.send(op, request).await?;
        if !response.status().is_success() {
            return Err(ApiError::NotFound {
                op,
                what: format!("role {role}"),
                status: response.status(),
            });
        }
        Self::json(op, response).await
    }

    async fn create(&self, user: &NewUser) -> Result<(), ApiError> {
        let op = ApiOp::Create;
        let url = self.endpoint(op, "api/save")?;
        let response = self.send(op, self.client.post(url).json(user)).await?;
        if !response.status().is_success() {
            return Err(ApiError::Rejected {
                op,
                status: response.status(),
            });
        }
        Ok(())
    }

    async fn update(&self, update: &UserUpdate) -> Result<(), ApiError> {
        let op = ApiOp::Update;
        let url = self.endpoint(op, "api/update")?;
        let response = self.send(op, self.client.put(url).json(update)).await?;
        if !response.status().is_success() {
            return Err(ApiError::Rejected {
                op,
                status: response.status(),
            });
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: u64) -> Result<(), ApiError> {
        let op = ApiOp::DeleteById;
        let url = self.endpoint(op, "api/deleteById")?;
        let request = self.client.delete(url).query(&[("id", id)]);
        let response = self.send(op, request).await?;
        if !response.status().is_success() {
            return Err(ApiError::DeleteFailed {
                id,
                status: response.status(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> HttpUserService {
        HttpUserService::new(Url::parse(base).unwrap(), None).unwrap()
    }

    #[test]
    fn endpoints_resolve_against_bare_host() {
        let s = service("http://localhost:8080");
        let url = s.endpoint(ApiOp::ListAll, "api/findAll").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/findAll");
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let s = service("http://example.test/admin");
        let url = s.endpoint(ApiOp::DeleteById, "/api/deleteById").unwrap();
        assert_eq!(url.as_str(), "http://example.test/admin/api/deleteById");
    }
}
