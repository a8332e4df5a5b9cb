/// Temperature used for structured extraction (research, pricing, news).
pub const EXTRACTION_TEMPERATURE: f64 = 0.0;

/// Temperature used when writing the final battle card.
pub const WRITER_TEMPERATURE: f64 = 0.7;

/// Configuration for LLM requests.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Request JSON format output from the model.
    pub json_mode: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: WRITER_TEMPERATURE,
            max_tokens: 2048,
            json_mode: false,
        }
    }
}

impl LlmConfig {
    /// Deterministic configuration for strict-JSON extraction prompts.
    ///
    /// Asks the provider for a JSON object (`response_format` on OpenAI-style
    /// APIs, `format: "json"` on Ollama).
    pub fn extraction() -> Self {
        Self::default()
            .with_temperature(EXTRACTION_TEMPERATURE)
            .with_json_mode(true)
    }

    /// Creative configuration for long-form report writing.
    pub fn writer() -> Self {
        Self::default().with_temperature(WRITER_TEMPERATURE)
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }
}
