use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client;
use tracing::{debug, instrument};

use crate::ports::{ObjectBody, ObjectError, ObjectStore};

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn open_object(&self, location: &str, key: &str) -> Result<ObjectBody, ObjectError> {
        debug!("Getting stream from s3://{}/{}", location, key);

        let response = self
            .client
            .get_object()
            .bucket(location)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, location, key))?;

        Ok(Box::pin(response.body.into_async_read()))
    }
}

fn classify(err: SdkError<GetObjectError>, location: &str, key: &str) -> ObjectError {
    let location = location.to_string();
    let key = key.to_string();

    if let Some(service) = err.as_service_error() {
        if service.is_no_such_key() {
            return ObjectError::NotFound { location, key };
        }
        match service.code() {
            Some("AccessDenied") => return ObjectError::AccessDenied { location, key },
            Some("NoSuchBucket") | Some("NotFound") => {
                return ObjectError::NotFound { location, key }
            },
            _ => {},
        }
    }

    ObjectError::Unavailable {
        location,
        key,
        message: DisplayErrorContext(&err).to_string(),
    }
}
