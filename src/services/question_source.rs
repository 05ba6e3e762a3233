use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    config::GeneratorConfig,
    state::room::{Difficulty, Question},
};

/// Parameters for one quiz generation request.
#[derive(Debug, Clone)]
pub struct GenerationSpec {
    pub difficulty: Difficulty,
    pub categories: Vec<String>,
    pub question_count: u8,
    pub options_per_question: u8,
}

/// Failures of the external question source. Every variant is recoverable:
/// the lifecycle engine falls back to the built-in bank on any of them.
#[derive(Debug, Error)]
pub enum QuestionSourceError {
    #[error("question service credentials are not configured")]
    MissingCredentials,
    #[error("question service request failed")]
    Request(#[source] reqwest::Error),
    #[error("question service request timed out")]
    Timeout,
    #[error("question service returned status {status}")]
    Status { status: reqwest::StatusCode },
    #[error("question service returned an empty completion")]
    EmptyCompletion,
    #[error("question service returned malformed questions: {reason}")]
    Malformed { reason: String },
}

/// Abstraction over the external quiz generator so the lifecycle engine and
/// its tests do not depend on the HTTP client.
pub trait QuestionSource: Send + Sync {
    fn generate(
        &self,
        spec: GenerationSpec,
    ) -> BoxFuture<'static, Result<Vec<Question>, QuestionSourceError>>;
}

/// Question source backed by the Mistral chat-completions API.
#[derive(Clone)]
pub struct MistralQuestionSource {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Wire shape the model is instructed to answer with. Parsed strictly: the
/// whole completion content must be exactly a JSON array of these.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

impl MistralQuestionSource {
    /// Build the HTTP-backed source from the generator configuration.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
        }
    }

    async fn request_completion(
        &self,
        spec: &GenerationSpec,
    ) -> Result<String, QuestionSourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(QuestionSourceError::MissingCredentials);
        };

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(spec),
            }],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    QuestionSourceError::Timeout
                } else {
                    QuestionSourceError::Request(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuestionSourceError::Status { status });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(QuestionSourceError::Request)?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(QuestionSourceError::EmptyCompletion)
    }
}

impl QuestionSource for MistralQuestionSource {
    fn generate(
        &self,
        spec: GenerationSpec,
    ) -> BoxFuture<'static, Result<Vec<Question>, QuestionSourceError>> {
        let source = self.clone();
        Box::pin(async move {
            let content = source.request_completion(&spec).await?;
            let questions = parse_questions(&content, &spec)?;
            info!(
                count = questions.len(),
                model = %source.model,
                "question service produced a quiz"
            );
            Ok(questions)
        })
    }
}

fn build_prompt(spec: &GenerationSpec) -> String {
    let difficulty = match spec.difficulty {
        Difficulty::Easy => "easy",
        Difficulty::Medium => "medium",
        Difficulty::Hard => "hard",
    };
    format!(
        "Generate a {difficulty} level multiple-choice quiz with {count} questions. \
         Each question must have exactly {options} answer options. \
         The quiz should be based on these categories: {categories}. \
         Questions should be non-repetitive and cover a wide range of topics within the categories. \
         Answer with nothing but a JSON array of objects with \"question\", \"options\", and \
         \"correct_answer\" fields.",
        count = spec.question_count,
        options = spec.options_per_question,
        categories = spec.categories.join(", "),
    )
}

/// Strictly parse and validate a completion into domain questions.
///
/// The content must be exactly a JSON array of the documented shape; every
/// question must carry the requested number of options and a correct answer
/// that is one of them, and the array must match the requested count.
fn parse_questions(
    content: &str,
    spec: &GenerationSpec,
) -> Result<Vec<Question>, QuestionSourceError> {
    let raw: Vec<RawQuestion> =
        serde_json::from_str(content.trim()).map_err(|err| QuestionSourceError::Malformed {
            reason: err.to_string(),
        })?;

    if raw.len() != usize::from(spec.question_count) {
        return Err(QuestionSourceError::Malformed {
            reason: format!(
                "expected {} questions, got {}",
                spec.question_count,
                raw.len()
            ),
        });
    }

    raw.into_iter()
        .enumerate()
        .map(|(index, question)| {
            if question.question.trim().is_empty() {
                return Err(QuestionSourceError::Malformed {
                    reason: format!("question {index} has empty text"),
                });
            }
            if question.options.len() != usize::from(spec.options_per_question) {
                return Err(QuestionSourceError::Malformed {
                    reason: format!(
                        "question {index} has {} options, expected {}",
                        question.options.len(),
                        spec.options_per_question
                    ),
                });
            }
            if !question.options.contains(&question.correct_answer) {
                return Err(QuestionSourceError::Malformed {
                    reason: format!("question {index} lists a correct answer not in its options"),
                });
            }

            Ok(Question {
                text: question.question,
                options: question.options,
                correct_option: question.correct_answer,
            })
        })
        .collect()
}
