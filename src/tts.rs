use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Zephyr";

/// One piece of a generation response, in response order.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Audio { mime_type: String, data: Vec<u8> },
    Text(String),
}

#[async_trait]
pub trait SpeechGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<Vec<ResponsePart>>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, voice: String, temperature: f32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            voice,
            temperature,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                temperature: self.temperature,
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: &self.voice,
                        },
                    },
                },
            },
        }
    }
}

#[async_trait]
impl SpeechGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<Vec<ResponsePart>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        info!("Requesting speech from {} (voice {})", self.model, self.voice);
        debug!("Prompt: {}", prompt);

        let res = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("generation request failed with {}: {}", status, body);
        }

        let parsed: GenerateResponse = res.json().await?;
        parts_from_response(parsed)
    }
}

fn parts_from_response(response: GenerateResponse) -> anyhow::Result<Vec<ResponsePart>> {
    let mut parts = Vec::new();
    for part in response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
    {
        if let Some(inline) = part.inline_data {
            let data = BASE64.decode(inline.data.as_bytes())?;
            debug!("Received inline {} ({} bytes)", inline.mime_type, data.len());
            parts.push(ResponsePart::Audio {
                mime_type: inline.mime_type,
                data,
            });
        } else if let Some(text) = part.text {
            parts.push(ResponsePart::Text(text));
        } else {
            warn!("Skipping response part with no inline data or text");
        }
    }
    Ok(parts)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'a str; 1],
    temperature: f32,
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one HTTP request with `status` and `body`, yielding the raw request.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + body_len {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}", addr), handle)
    }

    fn client(base_url: &str) -> GeminiClient {
        let mut client =
            GeminiClient::new("secret-key".into(), "test-model".into(), "Puck".into(), 1.0)
                .with_base_url(base_url);
        // Loopback traffic must not go through an HTTP_PROXY from the environment.
        client.http = reqwest::Client::builder().no_proxy().build().unwrap();
        client
    }

    #[tokio::test]
    async fn posts_to_model_endpoint_with_key() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAEC" } }
            ] } }]
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;

        let parts = client(&format!("{}/", base_url))
            .generate("Say hi")
            .await
            .unwrap();
        assert_eq!(
            parts,
            vec![ResponsePart::Audio {
                mime_type: "audio/L16;codec=pcm;rate=24000".into(),
                data: vec![0, 1, 2],
            }]
        );

        let request = server.await.unwrap();
        assert!(
            request.starts_with("POST /v1beta/models/test-model:generateContent HTTP/1.1\r\n"),
            "{request}"
        );
        assert!(request.to_ascii_lowercase().contains("x-goog-api-key: secret-key\r\n"));
        assert!(request.contains("\"voiceName\":\"Puck\""));
        assert!(request.contains("\"text\":\"Say hi\""));
    }

    #[tokio::test]
    async fn error_status_carries_status_and_body() {
        let body = json!({ "error": { "code": 500, "message": "quota exhausted" } }).to_string();
        let (base_url, server) = serve_once("500 Internal Server Error", body).await;

        let err = client(&base_url).generate("Say hi").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"), "{message}");
        assert!(message.contains("quota exhausted"), "{message}");
        server.await.unwrap();
    }

    #[test]
    fn request_asks_for_audio_with_voice() {
        let client = GeminiClient::new("key".into(), DEFAULT_MODEL.into(), "Kore".into(), 0.5);
        let body = serde_json::to_value(client.request_body("hello")).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "temperature": 0.5,
                    "speechConfig": {
                        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } }
                    }
                }
            })
        );
    }

    #[test]
    fn flattens_parts_in_order() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "thinking" },
                            { "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAEC" } }
                        ]
                    },
                    "finishReason": "STOP"
                },
                { "finishReason": "SAFETY" },
                { "content": { "parts": [ { "functionCall": {} } ] } }
            ],
            "usageMetadata": { "promptTokenCount": 4 }
        }))
        .unwrap();

        let parts = parts_from_response(response).unwrap();
        assert_eq!(
            parts,
            vec![
                ResponsePart::Text("thinking".into()),
                ResponsePart::Audio {
                    mime_type: "audio/L16;codec=pcm;rate=24000".into(),
                    data: vec![0, 1, 2],
                },
            ]
        );
    }

    #[test]
    fn empty_response_has_no_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parts_from_response(response).unwrap().is_empty());
    }

    #[test]
    fn bad_base64_is_an_error() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "audio/L16", "data": "!!" } }
            ] } }]
        }))
        .unwrap();
        assert!(parts_from_response(response).is_err());
    }
}
