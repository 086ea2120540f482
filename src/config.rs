use reqwest::Url;
use std::env;

/// Default request body limit for direct uploads (10 MB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_endpoint: String,
    pub storage_access_key: String,
    pub storage_secret_key: String,
    pub storage_bucket: String,
    pub storage_region: String,
    pub app_url: Url,
    pub transfer_mode: TransferMode,
    pub server_port: u16,
    pub max_upload_bytes: usize,
}

/// How file bytes travel between the browser and the bucket.
/// Selects both the upload and the download route implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Bytes pass through this server
    Proxy,
    /// The server hands out presigned URLs and never touches the bytes
    Presigned,
}

impl std::str::FromStr for TransferMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proxy" => Ok(TransferMode::Proxy),
            "presigned" => Ok(TransferMode::Presigned),
            _ => Err(anyhow::anyhow!("Invalid transfer mode: {}", s)),
        }
    }
}

impl std::fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferMode::Proxy => f.write_str("proxy"),
            TransferMode::Presigned => f.write_str("presigned"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source. `from_env` is this over the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| anyhow::anyhow!("{} must be set", name))
        };

        let app_url = required("APP_URL")?;

        Ok(Config {
            storage_endpoint: required("STORAGE_ENDPOINT")?,
            storage_access_key: required("STORAGE_ACCESS_KEY_ID")?,
            storage_secret_key: required("STORAGE_SECRET_ACCESS_KEY")?,
            storage_bucket: required("STORAGE_BUCKET_NAME")?,
            storage_region: lookup("STORAGE_REGION")
                .filter(|region| !region.trim().is_empty())
                .unwrap_or_else(|| "auto".to_string()),
            app_url: Url::parse(&app_url)
                .map_err(|e| anyhow::anyhow!("APP_URL must be a valid URL: {}", e))?,
            transfer_mode: lookup("TRANSFER_MODE")
                .unwrap_or_else(|| "presigned".to_string())
                .parse()?,
            server_port: lookup("SERVER_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid SERVER_PORT: {}", e))?,
            max_upload_bytes: match lookup("MAX_UPLOAD_BYTES") {
                Some(value) => value
                    .parse()
                    .map_err(|e| anyhow::anyhow!("Invalid MAX_UPLOAD_BYTES: {}", e))?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let storage_values = [
            ("STORAGE_ENDPOINT", &self.storage_endpoint),
            ("STORAGE_ACCESS_KEY_ID", &self.storage_access_key),
            ("STORAGE_SECRET_ACCESS_KEY", &self.storage_secret_key),
            ("STORAGE_BUCKET_NAME", &self.storage_bucket),
        ];

        for (name, value) in storage_values {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("{} must not be empty", name));
            }
        }

        if self.app_url.cannot_be_a_base() {
            return Err(anyhow::anyhow!(
                "APP_URL must be an absolute base URL, got {}",
                self.app_url
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES must be greater than zero"));
        }

        Ok(())
    }

    /// Public URL under which an object key is served by this application
    pub fn download_url(&self, key: &str) -> String {
        format!(
            "{}/api/download/{}",
            self.app_url.as_str().trim_end_matches('/'),
            key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(overrides: &[(&str, &str)]) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = [
            ("STORAGE_ENDPOINT", "https://account.r2.cloudflarestorage.com"),
            ("STORAGE_ACCESS_KEY_ID", "access"),
            ("STORAGE_SECRET_ACCESS_KEY", "secret"),
            ("STORAGE_BUCKET_NAME", "codes"),
            ("APP_URL", "https://qr.example.com"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }
        vars
    }

    fn load(vars: HashMap<String, String>) -> anyhow::Result<Config> {
        let config = Config::from_lookup(|name| vars.get(name).cloned())?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = load(vars(&[])).unwrap();
        assert_eq!(config.transfer_mode, TransferMode::Presigned);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.storage_region, "auto");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_empty_region_falls_back_to_auto() {
        let config = load(vars(&[("STORAGE_REGION", "")])).unwrap();
        assert_eq!(config.storage_region, "auto");

        let config = load(vars(&[("STORAGE_REGION", "eu-west-1")])).unwrap();
        assert_eq!(config.storage_region, "eu-west-1");
    }

    #[test]
    fn test_missing_storage_value_is_fatal() {
        let mut vars = vars(&[]);
        vars.remove("STORAGE_BUCKET_NAME");
        let err = load(vars).unwrap_err();
        assert!(err.to_string().contains("STORAGE_BUCKET_NAME"));
    }

    #[test]
    fn test_empty_storage_value_is_fatal() {
        let err = load(vars(&[("STORAGE_SECRET_ACCESS_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("STORAGE_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn test_invalid_app_url_is_fatal() {
        let err = load(vars(&[("APP_URL", "not a url")])).unwrap_err();
        assert!(err.to_string().contains("APP_URL"));
    }

    #[test]
    fn test_transfer_mode_parsing() {
        let config = load(vars(&[("TRANSFER_MODE", "Proxy")])).unwrap();
        assert_eq!(config.transfer_mode, TransferMode::Proxy);
        assert!(load(vars(&[("TRANSFER_MODE", "carrier-pigeon")])).is_err());
    }

    #[test]
    fn test_download_url_trims_trailing_slash() {
        let config = load(vars(&[("APP_URL", "https://qr.example.com/")])).unwrap();
        assert_eq!(
            config.download_url("my-report-pdf"),
            "https://qr.example.com/api/download/my-report-pdf"
        );
    }
}
