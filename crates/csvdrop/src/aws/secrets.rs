use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use aws_sdk_secretsmanager::Client;

use crate::ports::{SecretError, SecretStore};

#[derive(Clone)]
pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    /// Returns the plain `SecretString`; binary secrets are not supported
    async fn get_secret(&self, reference: &str) -> Result<String, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(reference)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(GetSecretValueError::ResourceNotFoundException(_)) => {
                    SecretError::NotFound(reference.to_string())
                },
                _ => SecretError::Unavailable {
                    reference: reference.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                },
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretError::NotFound(reference.to_string()))
    }
}
