use std::env;
use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{Rgb, RgbImage};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use adforge_contracts::analysis::{check_content_contracts, ProductAnalysis};
use adforge_contracts::prompt::{analysis_prompt, image_prompt, SYSTEM_INSTRUCTION};
use adforge_contracts::schema::analysis_response_schema;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Failure of one oracle round trip, before any domain interpretation.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The request never produced a payload (connect, TLS, timeout).
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },
    /// The service answered with a non-success status (auth, quota, bad
    /// request). Carries the service's own message, truncated.
    #[error("{provider} request failed ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },
    /// A success status whose body was not the JSON envelope the service
    /// contract promises.
    #[error("{provider} returned an invalid response envelope")]
    InvalidEnvelope { provider: String },
    /// A well-formed envelope with no usable candidate content.
    #[error("{provider} returned an empty payload")]
    EmptyPayload { provider: String },
}

/// Failure of the analysis call. `Oracle` means "ask again later";
/// `MalformedResponse` means the payload will never parse, however often it
/// is retried, because the oracle violated its own schema contract.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("product name must not be empty")]
    EmptyProductName,
    #[error("market analysis request failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("Invalid response format from AI. Please try again.")]
    MalformedResponse { detail: String },
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image subject must not be empty")]
    EmptySubject,
    #[error("image generation request failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("Image generation failed")]
    NoInlineImage,
}

#[derive(Debug, Clone)]
pub struct TextRequest {
    pub model: String,
    pub system_instruction: String,
    pub prompt: String,
    pub response_schema: Value,
}

#[derive(Debug, Clone)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
}

/// One inline binary part from a candidate response. The base64 payload is
/// kept exactly as received and passed through into the data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data_base64: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub parts: Vec<InlineImage>,
}

/// The generative service seam. Implementations are interchangeable from
/// the clients' point of view: one live HTTP implementation, one
/// deterministic dry-run stand-in.
pub trait GenerativeOracle: Send + Sync {
    fn name(&self) -> &str;
    fn generate_text(&self, request: &TextRequest) -> Result<TextResponse, OracleError>;
    fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, OracleError>;
}

/// Live Gemini oracle over the `models/<model>:generateContent` REST surface.
pub struct GeminiOracle {
    api_base: String,
    api_key: String,
    http: HttpClient,
}

impl GeminiOracle {
    /// `api_key` may be empty: the request is still sent and the service
    /// answers with an auth error, surfaced as [`OracleError::Api`].
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_api_base(api_key, default_api_base())
    }

    pub fn with_api_base(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: HttpClient::new(),
        }
    }

    pub fn api_key_from_env() -> String {
        non_empty_env("GEMINI_API_KEY")
            .or_else(|| non_empty_env("GOOGLE_API_KEY"))
            .or_else(|| non_empty_env("API_KEY"))
            .unwrap_or_default()
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    /// Single attempt; every retry is a deliberate repeated user action.
    fn post(&self, model: &str, payload: &Value) -> Result<Value, OracleError> {
        let endpoint = self.endpoint_for_model(model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .map_err(|err| OracleError::Transport {
                provider: self.name().to_string(),
                message: err.to_string(),
            })?;
        response_json_or_error(self.name(), response)
    }
}

impl GenerativeOracle for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_text(&self, request: &TextRequest) -> Result<TextResponse, OracleError> {
        let payload = json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }],
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.response_schema,
            },
        });
        let response_payload = self.post(&request.model, &payload)?;
        let text = extract_candidate_text(&response_payload);
        if text.trim().is_empty() {
            return Err(OracleError::EmptyPayload {
                provider: self.name().to_string(),
            });
        }
        Ok(TextResponse { text })
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, OracleError> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
            },
        });
        let response_payload = self.post(&request.model, &payload)?;
        Ok(ImageResponse {
            parts: extract_inline_images(&response_payload),
        })
    }
}

/// Deterministic offline oracle: a contract-complete analysis synthesized
/// from the prompt, and a solid-color PNG whose color is derived from the
/// prompt digest. For tests and keyless development flows, not an offline
/// product mode.
#[derive(Debug, Default)]
pub struct DryRunOracle;

impl DryRunOracle {
    pub fn new() -> Self {
        Self
    }

    fn dryrun_piece(stage_key: &str, index: u64, prompt: &str) -> Value {
        let tag = short_id(prompt, index);
        json!({
            "id": format!("{stage_key}-{index}"),
            "title": format!("Dry-run angle {tag}"),
            "hooks": (1..=5).map(|n| format!("Hook {n} for {stage_key} piece {index}")).collect::<Vec<String>>(),
            "ideas": (1..=5).map(|n| format!("Idea {n} for {stage_key} piece {index}")).collect::<Vec<String>>(),
            "variations": [
                {
                    "headline": format!("Headline A ({tag})"),
                    "hook": "Scroll-stopping opener.",
                    "body": "Dry-run persuasive body copy.",
                    "cta": "Order now",
                },
                {
                    "headline": format!("Headline B ({tag})"),
                    "hook": "Second opener.",
                    "body": "Alternative dry-run body copy.",
                    "cta": "Message us",
                },
            ],
            "connection_psychology": "Trust through familiarity.",
            "recommended_format": "Short vertical video",
        })
    }

    fn dryrun_analysis(prompt: &str) -> Value {
        json!({
            "product_market_fit": {
                "core_problem": "Buyers cannot tell reliable sellers apart.",
                "urgency_level": "Medium",
                "demand_type": "Considered",
                "cultural_relevance": "Everyday household purchase.",
                "seasonality": "Year-round",
                "market_fit_score": 7.0,
                "price_sensitivity": "Medium",
            },
            "competition_analysis": {
                "estimated_active_sellers": "Medium",
                "avg_daily_sales_per_seller": "Low",
                "price_range_bdt": "300-1200",
                "competition_type": "Mixed",
                "ad_saturation": {
                    "facebook_instagram": 5.0,
                    "google_ads": 2.0,
                    "marketplaces": 6.0,
                },
                "entry_difficulty": "Moderate",
            },
            "customer_avatars": [{
                "avatar_name": "Value-minded urban shopper",
                "age_range": "25-40",
                "gender": "Any",
                "location": "Urban",
                "income_level": "Middle",
                "pain_points": ["Too many indistinguishable sellers"],
                "hidden_fears": ["Paying premium price for a counterfeit"],
                "desired_transformation": "A default brand they reorder without research",
                "buying_objections": ["Unknown seller reputation"],
                "purchase_triggers": ["Cash on delivery", "Visible reviews"],
            }],
            "ad_copies": {
                "cold_audience": [Self::dryrun_piece("cold", 1, prompt), Self::dryrun_piece("cold", 2, prompt)],
                "warm_audience": [Self::dryrun_piece("warm", 1, prompt)],
                "hot_audience": [Self::dryrun_piece("hot", 1, prompt)],
                "retargeting": [Self::dryrun_piece("retargeting", 1, prompt)],
                "retention": [Self::dryrun_piece("retention", 1, prompt)],
            },
            "retargeting_funnel_logic": {
                "cold_to_warm": "Retarget 50% video viewers with proof content.",
                "warm_to_hot": "Introduce a first-order incentive.",
                "retention_strategy": "Refill reminder after 30 days.",
                "recommended_sequence_days": ["3", "7", "14"],
            },
            "final_decision": {
                "verdict": "TEST",
                "decision_reasoning": "Dry-run verdict: validate with a small budget.",
                "optimization_requirements": ["Bengali landing page"],
                "starting_budget_bdt": 10000.0,
                "major_risks": ["Commodity price swings"],
            },
        })
    }
}

impl GenerativeOracle for DryRunOracle {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_text(&self, request: &TextRequest) -> Result<TextResponse, OracleError> {
        let payload = Self::dryrun_analysis(&request.prompt);
        let text = serde_json::to_string(&payload).map_err(|_| OracleError::EmptyPayload {
            provider: self.name().to_string(),
        })?;
        Ok(TextResponse { text })
    }

    fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, OracleError> {
        let (r, g, b) = color_from_prompt(&request.prompt);
        let mut canvas = RgbImage::new(64, 64);
        for pixel in canvas.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        let mut bytes: Vec<u8> = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|err| OracleError::Transport {
                provider: self.name().to_string(),
                message: format!("dry-run image encode failed: {err}"),
            })?;
        Ok(ImageResponse {
            parts: vec![InlineImage {
                data_base64: BASE64.encode(&bytes),
                mime_type: Some("image/png".to_string()),
            }],
        })
    }
}

/// Outcome of a successful analysis call: the parsed tree plus any count
/// contract violations, flagged on receipt and never repaired.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub analysis: ProductAnalysis,
    pub warnings: Vec<String>,
}

/// The research clients: one analysis call and one image call per
/// invocation, no internal retries, oracle injected at the seam.
pub struct ResearchEngine {
    oracle: Box<dyn GenerativeOracle>,
    text_model: String,
    image_model: String,
}

impl ResearchEngine {
    pub fn new(
        oracle: Box<dyn GenerativeOracle>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            oracle,
            text_model: text_model.into(),
            image_model: image_model.into(),
        }
    }

    /// Live engine with the credential read from the environment. An absent
    /// key becomes an empty string and fails at the oracle with an auth
    /// error, not at startup.
    pub fn gemini_from_env() -> Self {
        Self::new(
            Box::new(GeminiOracle::new(GeminiOracle::api_key_from_env())),
            DEFAULT_TEXT_MODEL,
            DEFAULT_IMAGE_MODEL,
        )
    }

    pub fn dry_run() -> Self {
        Self::new(Box::new(DryRunOracle::new()), "dryrun-text-1", "dryrun-image-1")
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    pub fn set_text_model(&mut self, model: impl Into<String>) {
        self.text_model = model.into();
    }

    pub fn set_image_model(&mut self, model: impl Into<String>) {
        self.image_model = model.into();
    }

    /// One schema-constrained analysis request for `product_name`.
    pub fn analyze(&self, product_name: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let trimmed = product_name.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::EmptyProductName);
        }
        let request = TextRequest {
            model: self.text_model.clone(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: analysis_prompt(trimmed),
            response_schema: analysis_response_schema(),
        };
        let response = self
            .oracle
            .generate_text(&request)
            .map_err(classify_text_error)?;
        let analysis = parse_analysis_payload(&response.text)?;
        let warnings = check_content_contracts(&analysis);
        Ok(AnalysisOutcome { analysis, warnings })
    }

    /// One image request for a content piece, returned as a self-contained
    /// `data:image/png;base64,...` URI.
    pub fn generate_image(&self, subject: &str) -> Result<String, ImageError> {
        let trimmed = subject.trim();
        if trimmed.is_empty() {
            return Err(ImageError::EmptySubject);
        }
        let request = ImageRequest {
            model: self.image_model.clone(),
            prompt: image_prompt(trimmed),
        };
        let response = self.oracle.generate_image(&request)?;
        let Some(part) = response
            .parts
            .iter()
            .find(|part| !part.data_base64.trim().is_empty())
        else {
            return Err(ImageError::NoInlineImage);
        };
        let data = part.data_base64.trim();
        if BASE64.decode(data.as_bytes()).is_err() {
            return Err(ImageError::NoInlineImage);
        }
        Ok(format!("data:image/png;base64,{data}"))
    }
}

fn classify_text_error(err: OracleError) -> AnalysisError {
    match err {
        OracleError::InvalidEnvelope { .. } | OracleError::EmptyPayload { .. } => {
            AnalysisError::MalformedResponse {
                detail: err.to_string(),
            }
        }
        other => AnalysisError::Oracle(other),
    }
}

/// Parses candidate text into the analysis tree. Empty or non-conforming
/// text is a malformed response, distinct from any transport failure.
pub fn parse_analysis_payload(text: &str) -> Result<ProductAnalysis, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::MalformedResponse {
            detail: "empty response text".to_string(),
        });
    }
    serde_json::from_str(trimmed).map_err(|err| AnalysisError::MalformedResponse {
        detail: err.to_string(),
    })
}

/// Concatenated text parts of the first candidate.
pub fn extract_candidate_text(response_payload: &Value) -> String {
    let parts = response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut text = String::new();
    for part in parts {
        if let Some(value) = part.get("text").and_then(Value::as_str) {
            text.push_str(value);
        }
    }
    text
}

/// All inline binary parts across all candidates, in response order. Both
/// `inlineData` and `inline_data` spellings are accepted.
pub fn extract_inline_images(response_payload: &Value) -> Vec<InlineImage> {
    let candidates = response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut out = Vec::new();

    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for part in parts {
            let inline = part
                .get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            out.push(InlineImage {
                data_base64: data.to_string(),
                mime_type,
            });
        }
    }

    out
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value, OracleError> {
    let status = response.status();
    let code = status.as_u16();
    let body = response.text().map_err(|err| OracleError::Transport {
        provider: provider.to_string(),
        message: format!("response body read failed: {err}"),
    })?;
    if !status.is_success() {
        return Err(OracleError::Api {
            provider: provider.to_string(),
            status: code,
            message: truncate_text(&body, 512),
        });
    }
    serde_json::from_str(&body).map_err(|_| OracleError::InvalidEnvelope {
        provider: provider.to_string(),
    })
}

fn default_api_base() -> String {
    env::var("GEMINI_API_BASE")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}

fn short_id(prompt: &str, idx: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(idx.to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}
