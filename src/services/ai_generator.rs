use async_trait::async_trait;
use rand::{seq::SliceRandom, Rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    config::AiConfig,
    errors::{GenerationError, ParseError},
    models::ChallengeDraft,
};

pub const SUPPORTED_LANGUAGES: [&str; 11] = [
    "Python",
    "JavaScript",
    "TypeScript",
    "Java",
    "C++",
    "C#",
    "Go",
    "Rust",
    "Swift",
    "PHP",
    "SQL",
];

pub const OPTION_COUNT: usize = 4;

const SYSTEM_PROMPT: &str = "You are a JSON generator API. You always output a valid JSON object.";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeGenerator: Send + Sync {
    async fn generate(&self, difficulty: &str) -> Result<ChallengeDraft, GenerationError>;
}

pub fn pick_language<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    SUPPORTED_LANGUAGES
        .choose(rng)
        .copied()
        .unwrap_or(SUPPORTED_LANGUAGES[0])
}

pub fn build_prompt(language: &str, difficulty: &str, target_language: &str) -> String {
    format!(
        r#"Act as a senior technical interviewer specialised in {language}.
Write ONE unique multiple-choice programming question for a {difficulty} level candidate in {language}.

LANGUAGE:
- The question, the options and the explanation must all be written in {target_language}.

CONTENT FORMAT:
- If the question asks about "the output of the following code", "what does this code print?" or similar,
  you MUST always include a code block in {language}.
- That code block must NOT be inside the title:
  - "title": the question text WITHOUT the code block.
  - "code": the {language} code block, with correct line breaks and indentation.
- If the question does not need any code, set "code" to the empty string "".

LEVELS:
- easy: basic syntax applied to small code fragments (lists, loops, conditionals).
- medium: arrays, objects, simple OOP, error handling, pure functions.
- hard: concurrency, performance, design patterns or subtle pitfalls.

RULES:
- Avoid trivial questions such as "what is a variable?".
- All 4 options must be plausible; do not use filler like "none of the above" unless it makes sense.

JSON STRUCTURE (MANDATORY):
{{
  "title": "Question in {target_language} without the code",
  "code": "{language} code block or empty string",
  "options": ["option 1", "option 2", "option 3", "option 4"],
  "correct_answer_id": 0,
  "explanation": "Explanation in {target_language}."
}}
"#
    )
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    title: String,
    #[serde(default)]
    code: Option<String>,
    options: Vec<String>,
    correct_answer_id: i64,
    explanation: String,
}

/// Parses the provider's content, checks its shape and normalizes it.
pub fn parse_draft(content: &str, language: &str) -> Result<ChallengeDraft, ParseError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let raw: RawDraft =
        serde_json::from_value(value).map_err(|e| ParseError::Schema(e.to_string()))?;

    if raw.options.len() != OPTION_COUNT {
        return Err(ParseError::Schema(format!(
            "expected {} options, got {}",
            OPTION_COUNT,
            raw.options.len()
        )));
    }

    if raw.correct_answer_id < 0 || raw.correct_answer_id >= OPTION_COUNT as i64 {
        return Err(ParseError::Schema(format!(
            "correct_answer_id {} is not an option index",
            raw.correct_answer_id
        )));
    }

    let title = if raw.title.contains(language) {
        raw.title
    } else {
        format!("[{}] {}", language, raw.title)
    };

    Ok(ChallengeDraft {
        title,
        code: raw.code.unwrap_or_default(),
        options: raw.options,
        correct_answer_id: raw.correct_answer_id as i32,
        explanation: raw.explanation,
    })
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiGenerator {
    client: Client,
    config: AiConfig,
}

impl OpenAiGenerator {
    pub fn new(config: AiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Generates a challenge for an already chosen programming language.
    pub async fn generate_in(
        &self,
        language: &str,
        difficulty: &str,
    ) -> Result<ChallengeDraft, GenerationError> {
        let prompt = build_prompt(language, difficulty, &self.config.target_language);
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        tracing::debug!(language, difficulty, model = %self.config.model, "requesting challenge");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyContent)?;

        Ok(parse_draft(&content, language)?)
    }
}

#[async_trait]
impl ChallengeGenerator for OpenAiGenerator {
    async fn generate(&self, difficulty: &str) -> Result<ChallengeDraft, GenerationError> {
        let language = pick_language(&mut rand::thread_rng());
        self.generate_in(language, difficulty).await
    }
}
