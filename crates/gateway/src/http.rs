//! `GenerationGateway` over the generative-language REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{ImageArtifact, UserImage},
    error::{GenerationError, GenerationStage},
    protocol::{
        GenerateContentRequest, GenerateContentResponse, Part, RemoteErrorBody, ResponseModality,
    },
};
use tracing::{debug, warn};

use crate::GenerationGateway;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub image_model: String,
    pub caption_model: String,
    pub request_timeout: Duration,
}

pub struct HttpGenerationGateway {
    http: Client,
    config: HttpGatewayConfig,
}

impl HttpGenerationGateway {
    pub fn new(config: HttpGatewayConfig) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn generate_content(
        &self,
        stage: GenerationStage,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = self.endpoint(model);
        debug!(%stage, %model, "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| transport_error(stage, &err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| transport_error(stage, &err))?;

        if !status.is_success() {
            let message = remote_error_message(status, &body);
            warn!(%stage, %model, %status, "generation request rejected: {message}");
            return Err(GenerationError::new(stage, message));
        }

        serde_json::from_slice(&body).map_err(|err| {
            GenerationError::new(stage, format!("malformed response from {model}: {err}"))
        })
    }
}

#[async_trait]
impl GenerationGateway for HttpGenerationGateway {
    async fn transform_image(
        &self,
        image: &UserImage,
        prompt: &str,
    ) -> Result<ImageArtifact, GenerationError> {
        let stage = GenerationStage::ImageTransform;
        let request = GenerateContentRequest::user_turn(vec![
            Part::inline(&image.mime_type, &image.data_base64),
            Part::text(prompt),
        ])
        .with_response_modalities(vec![ResponseModality::Image, ResponseModality::Text]);

        let response = self
            .generate_content(stage, &self.config.image_model, &request)
            .await?;

        match response.first_inline_data() {
            Some(inline) => Ok(ImageArtifact::new(&inline.mime_type, &inline.data)),
            None => Err(GenerationError::new(
                stage,
                response
                    .refusal_reason()
                    .unwrap_or_else(|| "the model did not return an image".to_string()),
            )),
        }
    }

    async fn generate_caption(&self, prompt: &str) -> Result<String, GenerationError> {
        let stage = GenerationStage::Caption;
        let request = GenerateContentRequest::user_turn(vec![Part::text(prompt)]);

        let response = self
            .generate_content(stage, &self.config.caption_model, &request)
            .await?;

        match response.joined_text() {
            Some(caption) => Ok(caption),
            None => Err(GenerationError::new(
                stage,
                response
                    .refusal_reason()
                    .unwrap_or_else(|| "the model did not return a caption".to_string()),
            )),
        }
    }
}

fn transport_error(stage: GenerationStage, err: &reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::new(stage, "the generation service timed out")
    } else if err.is_connect() {
        GenerationError::new(stage, format!("could not reach the generation service: {err}"))
    } else {
        GenerationError::new(stage, format!("generation request failed: {err}"))
    }
}

fn remote_error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<RemoteErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("generation service returned {status}"))
}
