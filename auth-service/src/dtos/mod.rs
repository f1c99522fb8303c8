use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ServiceTokenRequest {
    #[validate(length(min = 1, max = 100))]
    pub service_name: String,
    #[validate(length(min = 1))]
    pub service_secret: String,
}
