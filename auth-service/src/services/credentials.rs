//! Registered service identities.
//!
//! Configured as `SERVICE_CREDENTIALS=sales-service=secret1,purchase-service=secret2`.
//! Only SHA-256 digests are kept in memory and presented secrets are compared
//! in constant time.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use subtle::ConstantTimeEq;

use service_core::error::AppError;

type SecretDigest = [u8; 32];

#[derive(Clone)]
pub struct ServiceCredentials {
    digests: HashMap<String, SecretDigest>,
}

fn digest(secret: &str) -> SecretDigest {
    Sha256::digest(secret.as_bytes()).into()
}

impl ServiceCredentials {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let mut digests = HashMap::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, secret) = entry.split_once('=').ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "SERVICE_CREDENTIALS entries must look like name=secret"
                ))
            })?;

            let name = name.trim();
            if name.is_empty() || secret.is_empty() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SERVICE_CREDENTIALS contains an empty name or secret"
                )));
            }

            digests.insert(name.to_string(), digest(secret));
        }

        if digests.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SERVICE_CREDENTIALS must register at least one service"
            )));
        }

        Ok(Self { digests })
    }

    pub fn verify(&self, service_name: &str, presented: &str) -> bool {
        let presented = digest(presented);
        match self.digests.get(service_name) {
            Some(expected) => expected.as_slice().ct_eq(presented.as_slice()).into(),
            None => {
                // Same amount of work for unknown names.
                let _ = [0u8; 32].as_slice().ct_eq(presented.as_slice());
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

impl fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.digests.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ServiceCredentials")
            .field("services", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_verify() {
        let creds = ServiceCredentials::parse("sales-service=s1, purchase-service=p2").unwrap();
        assert_eq!(creds.len(), 2);
        assert!(creds.verify("sales-service", "s1"));
        assert!(creds.verify("purchase-service", "p2"));
        assert!(!creds.verify("sales-service", "p2"));
        assert!(!creds.verify("unknown", "s1"));
    }

    #[test]
    fn test_secret_may_contain_equals_sign() {
        let creds = ServiceCredentials::parse("svc=a=b").unwrap();
        assert!(creds.verify("svc", "a=b"));
    }

    #[test]
    fn test_rejects_malformed_entries() {
        assert!(ServiceCredentials::parse("no-separator").is_err());
        assert!(ServiceCredentials::parse("=secret").is_err());
        assert!(ServiceCredentials::parse("").is_err());
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let creds = ServiceCredentials::parse("svc=hunter2").unwrap();
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("hunter2"));
    }
}
