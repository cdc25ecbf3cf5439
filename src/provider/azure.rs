//! Azure OpenAI provider.

use async_trait::async_trait;

use crate::config::{require, ServiceEndpoints};
use crate::error::DocentError;

use super::http::key_headers;
use super::openai::OpenAiProvider;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const DEFAULT_API_VERSION: &str = "2024-06-01";

/// Azure OpenAI Service provider bound to one chat deployment.
pub struct AzureOpenAiProvider {
    inner: OpenAiProvider,
}

impl AzureOpenAiProvider {
    /// Create with Azure-specific endpoint.
    /// `endpoint`: e.g., "https://myresource.openai.azure.com"
    /// `deployment`: e.g., "gpt-4o"
    /// `api_version`: e.g., "2024-06-01"
    pub fn new(endpoint: &str, deployment: &str, api_key: &str, api_version: &str) -> Self {
        let url = deployment_url(endpoint, deployment, "chat/completions", api_version);
        Self {
            inner: OpenAiProvider::with_endpoint(
                "azure-openai",
                deployment,
                url,
                key_headers("api-key", api_key),
            ),
        }
    }

    /// Build from configured endpoints.
    pub fn from_endpoints(endpoints: &ServiceEndpoints) -> Result<Self, DocentError> {
        Ok(Self::new(
            require(&endpoints.openai_endpoint, "AZURE_OPENAI_ENDPOINT")?,
            require(&endpoints.openai_deployment, "AZURE_OPENAI_DEPLOYMENT_NAME")?,
            require(&endpoints.openai_api_key, "AZURE_OPENAI_API_KEY")?,
            endpoints
                .openai_api_version
                .as_deref()
                .unwrap_or(DEFAULT_API_VERSION),
        ))
    }
}

/// URL of an operation on an Azure OpenAI deployment.
pub(crate) fn deployment_url(
    endpoint: &str,
    deployment: &str,
    operation: &str,
    api_version: &str,
) -> String {
    format!(
        "{}/openai/deployments/{}/{}?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        operation,
        api_version
    )
}

#[async_trait]
impl ModelProvider for AzureOpenAiProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, DocentError> {
        self.inner.generate_text(request).await
    }
}
