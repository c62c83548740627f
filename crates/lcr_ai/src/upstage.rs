use lcr_core::error::AppError;

/// Shared client for the Upstage Solar API family (embeddings, chat,
/// groundedness). Holds the endpoint and credential; individual services
/// build their own requests on top of it.
#[derive(Debug, Clone)]
pub struct UpstageClient {
    base_url: String,
    api_key: String,
}

impl UpstageClient {
    /// Create a client. The key must be present and the endpoint must be an
    /// http(s) URL; a missing credential is a typed construction error, not
    /// an implicit None discovered at call time.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "API base URL must be an http(s) endpoint",
            )
            .with_details(format!("base_url={base_url}")));
        }

        let api_key = api_key.unwrap_or("").trim();
        if api_key.is_empty() {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "API key is not configured",
            ));
        }

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Cheap reachability probe against the models listing.
    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/models", self.base_url);
        let resp = ureq::get(&url)
            .set("Authorization", &self.bearer())
            .timeout(std::time::Duration::from_millis(2_000))
            .call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("AI_SERVICE_UNHEALTHY", "API health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                "AI_SERVICE_UNREACHABLE",
                "Failed to reach the API endpoint",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}
