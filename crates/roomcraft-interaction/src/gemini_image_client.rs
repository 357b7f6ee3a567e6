//! GeminiImageClient - REST implementation of the generation boundary.
//!
//! Talks to the Gemini `generateContent` endpoint directly. Images travel as
//! base64 `inlineData` parts, each preceded by a short text part naming its
//! label so instructions can refer to "Input 1", "Input 2" and so on.
//! The credential is loaded from secret.json.

use async_trait::async_trait;
use roomcraft_core::config::GenerationSettings;
use roomcraft_core::error::{Result, RoomcraftError};
use roomcraft_core::generation::{GenerationClient, GenerationRequest, GenerationTask};
use roomcraft_core::media::ImageHandle;
use roomcraft_core::secret::SecretService;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Generation client that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    api_key: String,
    settings: GenerationSettings,
}

impl GeminiImageClient {
    /// Creates a client with the provided API key.
    ///
    /// A blank key is rejected with `CredentialMissing`.
    pub fn new(api_key: impl Into<String>, settings: GenerationSettings) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RoomcraftError::CredentialMissing);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| RoomcraftError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    /// Loads the credential through `secrets`.
    ///
    /// A `model_name` in secret.json overrides the configured image model.
    pub async fn try_from_secrets(
        secrets: &dyn SecretService,
        mut settings: GenerationSettings,
    ) -> Result<Self> {
        let config = secrets.load_secrets().await?;
        let api_key = config
            .gemini_api_key()
            .ok_or(RoomcraftError::CredentialMissing)?
            .to_string();

        if let Some(model) = config
            .gemini
            .as_ref()
            .and_then(|g| g.model_name.as_deref())
            .filter(|m| !m.trim().is_empty())
        {
            settings.image_model = model.to_string();
        }

        Self::new(api_key, settings)
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    fn model_for(&self, task: GenerationTask) -> &str {
        if produces_image(task) {
            &self.settings.image_model
        } else {
            &self.settings.analysis_model
        }
    }

    async fn send_request(
        &self,
        task: GenerationTask,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{base}/{model}:generateContent",
            base = self.settings.base_url.trim_end_matches('/'),
            model = self.model_for(task),
        );

        tracing::debug!("[GeminiImageClient] Sending {} request", task);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| map_transport_error(task, err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(task, status, body_text));
        }

        response
            .json()
            .await
            .map_err(|err| map_transport_error(task, err))
    }
}

#[async_trait]
impl GenerationClient for GeminiImageClient {
    async fn generate_image(&self, request: GenerationRequest) -> Result<ImageHandle> {
        let task = request.task;
        let body = build_request(&request, true);
        let response = self.send_request(task, &body).await?;
        extract_image_response(task, response)
    }

    async fn generate_text(&self, request: GenerationRequest) -> Result<String> {
        let task = request.task;
        let body = build_request(&request, false);
        let response = self.send_request(task, &body).await?;
        extract_text_response(task, response)
    }
}

fn produces_image(task: GenerationTask) -> bool {
    !matches!(
        task,
        GenerationTask::AnalyzeFloorplan
            | GenerationTask::DetectHotspots
            | GenerationTask::DetectStructuralHotspots
            | GenerationTask::ComplianceAudit
            | GenerationTask::DesignAudit
    )
}

fn build_request(request: &GenerationRequest, wants_image: bool) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(request.images.len() * 2 + 1);
    for input in &request.images {
        parts.push(Part::Text {
            text: format!("{}:", input.label),
        });
        parts.push(Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: input.image.mime_type().to_string(),
                data: input.image.to_base64(),
            },
        });
    }
    parts.push(Part::Text {
        text: request.instruction.clone(),
    });

    let system_instruction = request.system_instruction.as_ref().map(|text| Content {
        role: "system".to_string(),
        parts: vec![Part::Text { text: text.clone() }],
    });

    let generation_config = if wants_image {
        let image_config = if request.options.aspect_ratio.is_some()
            || request.options.image_size.is_some()
        {
            Some(ImageConfig {
                aspect_ratio: request.options.aspect_ratio.clone(),
                image_size: request.options.image_size.clone(),
            })
        } else {
            None
        };
        Some(GenerationConfig {
            response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            response_mime_type: None,
            image_config,
        })
    } else {
        Some(GenerationConfig {
            response_modalities: None,
            response_mime_type: Some("application/json".to_string()),
            image_config: None,
        })
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
        system_instruction,
        generation_config,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataResponse {
    mime_type: Option<String>,
    data: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn first_parts(response: GenerateContentResponse) -> Vec<PartResponse> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default()
}

fn extract_image_response(
    task: GenerationTask,
    response: GenerateContentResponse,
) -> Result<ImageHandle> {
    let inline = first_parts(response)
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find(|data| data.data.as_deref().is_some_and(|d| !d.is_empty()))
        .ok_or_else(|| {
            RoomcraftError::generation(task.to_string(), "Response contained no image")
        })?;

    let mime_type = inline
        .mime_type
        .unwrap_or_else(|| "image/png".to_string());
    ImageHandle::from_base64(mime_type, inline.data.as_deref().unwrap_or_default())
        .map_err(|e| RoomcraftError::generation(task.to_string(), e.to_string()))
}

fn extract_text_response(task: GenerationTask, response: GenerateContentResponse) -> Result<String> {
    let text: String = first_parts(response)
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(RoomcraftError::generation(
            task.to_string(),
            "Response contained no text",
        ));
    }
    Ok(text)
}

fn map_transport_error(task: GenerationTask, err: reqwest::Error) -> RoomcraftError {
    if err.is_timeout() {
        return RoomcraftError::Timeout {
            operation: task.to_string(),
        };
    }
    let status_code = err.status().map(|s| s.as_u16());
    RoomcraftError::Generation {
        operation: task.to_string(),
        message: format!("Gemini API request failed: {}", err.without_url()),
        status_code,
    }
}

fn map_http_error(task: GenerationTask, status: StatusCode, body: String) -> RoomcraftError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::warn!("[GeminiImageClient] Credential rejected: {}", message);
    }

    RoomcraftError::Generation {
        operation: task.to_string(),
        message,
        status_code: Some(status.as_u16()),
    }
}
