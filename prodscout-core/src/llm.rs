//! Language-model service client.
//!
//! OpenAI-compatible chat completions with function calling. Carries the
//! research-run operations (video analysis, final report synthesis) and
//! the wizard operations (product info, comparisons, recommendations).
//! Requests are plain `json!` bodies; responses are parsed by hand and
//! every shape violation becomes a descriptive parse error.

use crate::config::{LlmConfig, resolve_api_key};
use crate::diagnostics::{ApiLog, ApiService, LogSink};
use crate::error::{ApiError, ConfigError};
use crate::types::{FeatureSet, FinalReport, ProductComparison, ProductInfo, ProductRecommendations};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

/// Chat-completion language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Analyze a batch of review-video transcripts for one product.
    ///
    /// Returns a single markdown analysis covering every transcript in
    /// the batch.
    async fn analyze_videos(
        &self,
        product: &str,
        features: &FeatureSet,
        transcripts: &[String],
    ) -> Result<String, ApiError>;

    /// Synthesize the structured final report from all gathered evidence.
    ///
    /// Returns the raw JSON text, validated against [`FinalReport`].
    async fn final_report(
        &self,
        product: &str,
        features: &FeatureSet,
        video_analysis: &str,
        website_summary: &str,
        forum_summary: &str,
    ) -> Result<String, ApiError>;

    /// Fetch key considerations for a known product.
    async fn product_info(&self, product_name: &str) -> Result<ProductInfo, ApiError>;

    /// Suggest the closest alternatives to a product.
    async fn product_comparisons(&self, product_name: &str) -> Result<ProductComparison, ApiError>;

    /// Recommend products matching a free-form description of needs.
    async fn product_recommendations(
        &self,
        description: &str,
    ) -> Result<ProductRecommendations, ApiError>;
}

/// HTTP implementation of [`LanguageModel`].
pub struct LlmApi {
    client: Client,
    config: LlmConfig,
    api_key: String,
    logs: LogSink,
}

impl LlmApi {
    /// Create a client, resolving the API key from the environment
    /// variable named in the config.
    pub fn new(config: LlmConfig, logs: LogSink) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        Ok(Self {
            client: Client::new(),
            config,
            api_key,
            logs,
        })
    }

    /// POST a chat-completion body and return the parsed response JSON.
    async fn chat(&self, body: Value) -> Result<Value, ApiError> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let entry = ApiLog::post(ApiService::Llm, "chat/completions", body.clone());
        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                self.logs.record(entry.with_error(e.to_string()));
                return Err(ApiError::Request {
                    message: format!("chat completion request failed: {e}"),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            self.logs
                .record(entry.with_response(status.as_u16(), None).with_error(&text));
            return Err(ApiError::from_status("llm", status.as_u16(), &text));
        }

        let parsed: Value = response.json().await.map_err(|e| ApiError::ResponseParse {
            message: format!("chat completion returned invalid JSON: {e}"),
        })?;
        self.logs
            .record(entry.with_response(status.as_u16(), Some(parsed.clone())));
        Ok(parsed)
    }

    /// Base request body with model, temperature, and token limit filled in.
    fn base_body(&self, system: &str, user: String) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }

    /// Call the model with a single forced function and deserialize the
    /// function-call arguments into `T`.
    async fn call_function<T: DeserializeOwned>(
        &self,
        system: &str,
        user: String,
        tool: Value,
        name: &str,
    ) -> Result<T, ApiError> {
        let mut body = self.base_body(system, user);
        body["tools"] = json!([{ "type": "function", "function": tool }]);
        body["tool_choice"] = json!({ "type": "function", "function": { "name": name } });

        let response = self.chat(body).await?;
        parse_tool_arguments(&response, name)
    }
}

/// Extract plain message content from a chat-completion response.
fn parse_content(body: &Value) -> Result<String, ApiError> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| ApiError::ResponseParse {
            message: "invalid response format from language model: missing message content"
                .to_string(),
        })?;
    if content.is_empty() {
        return Err(ApiError::ResponseParse {
            message: "language model returned empty content".to_string(),
        });
    }
    Ok(content.to_string())
}

/// Extract and deserialize the arguments of the first tool call.
fn parse_tool_arguments<T: DeserializeOwned>(body: &Value, name: &str) -> Result<T, ApiError> {
    let arguments = body
        .pointer("/choices/0/message/tool_calls/0/function/arguments")
        .and_then(|a| a.as_str())
        .ok_or_else(|| ApiError::ResponseParse {
            message: format!("language model did not call function '{name}'"),
        })?;
    serde_json::from_str(arguments).map_err(|e| ApiError::ResponseParse {
        message: format!("invalid arguments for function '{name}': {e}"),
    })
}

/// Validate that report text is the structured JSON the caller expects.
fn validate_report(content: &str) -> Result<(), ApiError> {
    serde_json::from_str::<FinalReport>(content).map_err(|e| ApiError::ResponseParse {
        message: format!("final report is not valid structured JSON: {e}"),
    })?;
    Ok(())
}

// --- Function schemas ------------------------------------------------------

fn considerations_schema() -> Value {
    json!({
        "type": "array",
        "description": "A list of key-value pairs representing product considerations",
        "items": {
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "The type of consideration (e.g., price, quality, battery life)"
                },
                "value": {
                    "type": "string",
                    "description": "The details or description of the consideration"
                }
            },
            "required": ["key", "value"]
        }
    })
}

fn product_info_function() -> Value {
    json!({
        "name": "get_product_info",
        "description": "Provides detailed product information and recommendations",
        "parameters": {
            "type": "object",
            "properties": {
                "productName": {
                    "type": "string",
                    "description": "The name of the product"
                },
                "considerations": considerations_schema()
            },
            "required": ["productName", "considerations"]
        }
    })
}

fn product_comparisons_function() -> Value {
    json!({
        "name": "get_product_comparisons",
        "description": "Provides comparison information for a product and its alternatives",
        "parameters": {
            "type": "object",
            "properties": {
                "mainProduct": {
                    "type": "string",
                    "description": "The main product being researched"
                },
                "alternatives": {
                    "type": "array",
                    "description": "List of alternative products",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {
                                "type": "string",
                                "description": "Name of the alternative product"
                            },
                            "considerations": considerations_schema()
                        },
                        "required": ["name", "considerations"]
                    }
                }
            },
            "required": ["mainProduct", "alternatives"]
        }
    })
}

fn product_recommendations_function() -> Value {
    json!({
        "name": "get_product_recommendations",
        "description": "Provides product recommendations based on user requirements",
        "parameters": {
            "type": "object",
            "properties": {
                "recommendations": {
                    "type": "array",
                    "description": "List of recommended products",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {
                                "type": "string",
                                "description": "Name of the recommended product"
                            },
                            "considerations": considerations_schema()
                        },
                        "required": ["name", "considerations"]
                    }
                }
            },
            "required": ["recommendations"]
        }
    })
}

// --- Prompt builders -------------------------------------------------------

fn analysis_prompt(product: &str, features: &FeatureSet, transcripts: &[String]) -> String {
    let transcript_block = transcripts
        .iter()
        .enumerate()
        .map(|(i, t)| format!("Transcript of video {}: {}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Analyze these YouTube transcripts about {product}. For each video:\n\
         1) Generate a small summary of the video/content\n\
         2) Analyze how the product performs regarding these very important features: {}\n\
         3) Analyze how the product performs regarding these important features: {}\n\
         4) List important considerations not included above\n\
         5) List complaints or limitations\n\n\
         If information isn't provided for any given variable, output null.\n\n\
         {transcript_block}\n\n\
         Important: avoid generalized praise for the product. This needs to be a report that dives into the specifics.\n\n\
         Format the response in Markdown with appropriate headers and bullet points.",
        features.very_important.join(", "),
        features.important.join(", "),
    )
}

fn report_prompt(
    product: &str,
    features: &FeatureSet,
    video_analysis: &str,
    website_summary: &str,
    forum_summary: &str,
) -> String {
    format!(
        "Generate a JSON report for {product} with this exact structure:\n\
         {{\n\
           \"introduction\": \"Brief product introduction\",\n\
           \"features\": [\n\
             {{\n\
               \"name\": \"Feature name\",\n\
               \"importance\": \"Very Important or Important\",\n\
               \"analysis\": \"Detailed analysis\"\n\
             }}\n\
           ],\n\
           \"limitations\": [\"List of limitations\"],\n\
           \"conclusion\": \"Final summary\"\n\
         }}\n\n\
         Very Important Features: {}\n\
         Important Features: {}\n\n\
         Research Data:\n\
         YouTube Analysis: {video_analysis}\n\
         Website Analysis: {website_summary}\n\
         Reddit Analysis: {forum_summary}\n\n\
         Remember:\n\
         1. Response MUST be valid JSON\n\
         2. Include ALL features listed above\n\
         3. Mark importance correctly based on the feature lists\n\
         4. Provide detailed analysis for each feature\n\
         5. DO NOT add any markdown or text outside the JSON structure",
        features.very_important.join(", "),
        features.important.join(", "),
    )
}

#[async_trait]
impl LanguageModel for LlmApi {
    async fn analyze_videos(
        &self,
        product: &str,
        features: &FeatureSet,
        transcripts: &[String],
    ) -> Result<String, ApiError> {
        debug!(product, videos = transcripts.len(), "analyzing transcripts");
        let body = self.base_body(
            "You are a helpful assistant that analyzes product reviews from YouTube videos. \
             Format your response in Markdown.",
            analysis_prompt(product, features, transcripts),
        );
        let response = self.chat(body).await?;
        parse_content(&response)
    }

    async fn final_report(
        &self,
        product: &str,
        features: &FeatureSet,
        video_analysis: &str,
        website_summary: &str,
        forum_summary: &str,
    ) -> Result<String, ApiError> {
        debug!(product, "generating final report");
        let mut body = self.base_body(
            "You are a helpful assistant that generates comprehensive product research reports. \
             Your response must be in valid JSON format with the exact structure specified in \
             the user prompt.",
            report_prompt(
                product,
                features,
                video_analysis,
                website_summary,
                forum_summary,
            ),
        );
        body["response_format"] = json!({ "type": "json_object" });

        let response = self.chat(body).await?;
        let content = parse_content(&response)?;
        validate_report(&content)?;
        Ok(content)
    }

    async fn product_info(&self, product_name: &str) -> Result<ProductInfo, ApiError> {
        self.call_function(
            "You are a helpful assistant that provides detailed product information and recommendations.",
            format!(
                "Provide detailed considerations for the product \"{product_name}\". \
                 Include various relevant attributes and their descriptions."
            ),
            product_info_function(),
            "get_product_info",
        )
        .await
    }

    async fn product_comparisons(&self, product_name: &str) -> Result<ProductComparison, ApiError> {
        self.call_function(
            "You are a helpful assistant that provides detailed product comparisons.",
            format!(
                "A user is considering buying \"{product_name}\". Suggest the top 3 most \
                 relevant alternative products that serve a similar purpose."
            ),
            product_comparisons_function(),
            "get_product_comparisons",
        )
        .await
    }

    async fn product_recommendations(
        &self,
        description: &str,
    ) -> Result<ProductRecommendations, ApiError> {
        self.call_function(
            "You are a helpful assistant that provides product recommendations based on user needs.",
            format!(
                "Based on the following description, suggest the top 4 most relevant products \
                 that meet the user's needs: \"{description}\""
            ),
            product_recommendations_function(),
            "get_product_recommendations",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureSet {
        FeatureSet {
            very_important: vec!["battery life".into()],
            important: vec!["weight".into(), "keyboard".into()],
        }
    }

    fn make_api() -> LlmApi {
        LlmApi {
            client: Client::new(),
            config: LlmConfig::default(),
            api_key: "test-key".to_string(),
            logs: LogSink::new(),
        }
    }

    #[test]
    fn request_body_carries_configured_token_limit() {
        let api = make_api();
        let body = api.base_body("system prompt", "user prompt".to_string());
        assert_eq!(body["model"], json!("gpt-4-1106-preview"));
        assert_eq!(body["max_tokens"], json!(4096));
        assert_eq!(body["messages"][0]["content"], json!("system prompt"));
    }

    #[test]
    fn request_body_follows_config_overrides() {
        let mut api = make_api();
        api.config.max_tokens = 256;
        let body = api.base_body("s", "u".to_string());
        assert_eq!(body["max_tokens"], json!(256));
    }

    #[test]
    fn tool_arguments_deserialize_into_typed_answers() {
        let body = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "get_product_info",
                            "arguments": r#"{"productName": "ThinkPad X1", "considerations": [{"key": "price", "value": "premium"}]}"#
                        }
                    }]
                }
            }]
        });
        let info: ProductInfo = parse_tool_arguments(&body, "get_product_info").unwrap();
        assert_eq!(info.product_name, "ThinkPad X1");
        assert_eq!(info.considerations[0].key, "price");
    }

    #[test]
    fn missing_tool_call_is_rejected() {
        let body = json!({
            "choices": [{ "message": { "content": "I refuse to call functions" } }]
        });
        let err = parse_tool_arguments::<ProductInfo>(&body, "get_product_info").unwrap_err();
        assert!(err.to_string().contains("get_product_info"));
    }

    #[test]
    fn malformed_tool_arguments_are_rejected() {
        let body = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": { "name": "get_product_info", "arguments": "{\"productName\": 42}" }
                    }]
                }
            }]
        });
        let err = parse_tool_arguments::<ProductInfo>(&body, "get_product_info").unwrap_err();
        assert!(matches!(err, ApiError::ResponseParse { .. }));
    }

    #[test]
    fn empty_content_is_rejected() {
        let body = json!({ "choices": [{ "message": { "content": "" } }] });
        let err = parse_content(&body).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn report_missing_required_field_is_rejected() {
        // No "conclusion".
        let raw = r#"{"introduction": "x", "features": [], "limitations": []}"#;
        let err = validate_report(raw).unwrap_err();
        assert!(matches!(err, ApiError::ResponseParse { .. }));
    }

    #[test]
    fn report_with_all_fields_passes() {
        let raw = r#"{
            "introduction": "x",
            "features": [{"name": "battery", "importance": "Very Important", "analysis": "lasts"}],
            "limitations": ["price"],
            "conclusion": "y"
        }"#;
        assert!(validate_report(raw).is_ok());
    }

    #[test]
    fn analysis_prompt_numbers_transcripts() {
        let prompt = analysis_prompt(
            "ThinkPad X1",
            &features(),
            &["first transcript".into(), "second transcript".into()],
        );
        assert!(prompt.contains("Transcript of video 1: first transcript"));
        assert!(prompt.contains("Transcript of video 2: second transcript"));
        assert!(prompt.contains("battery life"));
        assert!(prompt.contains("weight, keyboard"));
    }

    #[test]
    fn report_prompt_embeds_evidence() {
        let prompt = report_prompt("ThinkPad X1", &features(), "yt", "web", "forum");
        assert!(prompt.contains("YouTube Analysis: yt"));
        assert!(prompt.contains("Website Analysis: web"));
        assert!(prompt.contains("Reddit Analysis: forum"));
        assert!(prompt.contains("Very Important Features: battery life"));
    }

    #[test]
    fn function_schemas_require_their_fields() {
        let info = product_info_function();
        assert_eq!(
            info["parameters"]["required"],
            json!(["productName", "considerations"])
        );
        let cmp = product_comparisons_function();
        assert_eq!(
            cmp["parameters"]["required"],
            json!(["mainProduct", "alternatives"])
        );
        let rec = product_recommendations_function();
        assert_eq!(rec["parameters"]["required"], json!(["recommendations"]));
    }
}
