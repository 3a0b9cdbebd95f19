//! Alexa custom-skill JSON envelopes
//!
//! Only the fields the skill uses are modelled; everything else in the
//! request is ignored.

use serde::{Deserialize, Serialize};

use super::Response;

const VERSION: &str = "1.0";

// === Request Types ===

#[derive(Debug, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub session: Option<Session>,
    pub request: Request,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub new: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    LaunchRequest {
        #[serde(default)]
        request_id: String,
    },
    #[serde(rename_all = "camelCase")]
    IntentRequest {
        #[serde(default)]
        request_id: String,
        intent: Intent,
    },
    #[serde(rename_all = "camelCase")]
    SessionEndedRequest {
        #[serde(default)]
        request_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct Intent {
    pub name: String,
    /// Decoded but not used by any handler
    #[allow(dead_code)]
    #[serde(default)]
    pub slots: serde_json::Value,
}

// === Response Types ===

#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    pub version: &'static str,
    pub response: ResponseBody,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<SimpleCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SimpleCard {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

fn plain_text(text: String) -> OutputSpeech {
    OutputSpeech {
        kind: "PlainText",
        text,
    }
}

impl ResponseEnvelope {
    /// Acknowledge a request that gets no spoken answer
    pub fn empty() -> Self {
        Self {
            version: VERSION,
            response: ResponseBody::default(),
        }
    }
}

impl From<Response> for ResponseEnvelope {
    fn from(response: Response) -> Self {
        let should_end_session = response.ends_session();
        Self {
            version: VERSION,
            response: ResponseBody {
                output_speech: Some(plain_text(response.spoken_text)),
                card: response.card.map(|card| SimpleCard {
                    kind: "Simple",
                    title: card.title,
                    content: card.body,
                }),
                reprompt: response.reprompt.map(|text| Reprompt {
                    output_speech: plain_text(text),
                }),
                should_end_session: Some(should_end_session),
            },
        }
    }
}
