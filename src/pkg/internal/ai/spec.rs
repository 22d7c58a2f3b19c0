use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentScorecard {
    pub quality_score: i32,
    pub strengths: Vec<String>,
    pub areas_to_probe: Vec<String>,
    pub summary: String,
}

/// Spoken English fluency judged from the transcript. `vocabulary_clarity` and
/// `sentence_flow` are persisted as the pronunciation and pace scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluencyScorecard {
    pub vocabulary_clarity: i32,
    pub sentence_flow: i32,
    pub hesitation: i32,
    pub grammar: i32,
    pub overall: i32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecards {
    pub content: ContentScorecard,
    pub fluency: FluencyScorecard,
}

impl Scorecards {
    pub fn clamped(mut self) -> Self {
        let clamp = |v: i32| v.clamp(0, 100);
        self.content.quality_score = clamp(self.content.quality_score);
        self.fluency.vocabulary_clarity = clamp(self.fluency.vocabulary_clarity);
        self.fluency.sentence_flow = clamp(self.fluency.sentence_flow);
        self.fluency.hesitation = clamp(self.fluency.hesitation);
        self.fluency.grammar = clamp(self.fluency.grammar);
        self.fluency.overall = clamp(self.fluency.overall);
        self
    }
}

/// The question a transcript answers, as handed to the scoring model.
#[derive(Debug, Clone)]
pub struct QuestionPrompt {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionToolResult {
    pub transcription: String,
}

/// A function tool the model is forced to call.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolSpec {
    pub fn transcription() -> Self {
        ToolSpec {
            name: "transcribe_audio",
            description: "Return the verbatim transcription of the candidate's spoken answer",
            parameters: json!({
                "type": "object",
                "properties": {
                    "transcription": {
                        "type": "string",
                        "description": "Verbatim transcript, no commentary"
                    }
                },
                "required": ["transcription"]
            }),
        }
    }

    pub fn scorecards() -> Self {
        let score = json!({ "type": "integer", "minimum": 0, "maximum": 100 });
        let list = json!({ "type": "array", "items": { "type": "string" } });
        ToolSpec {
            name: "submit_scorecards",
            description: "Submit the content quality and English fluency scorecards for one answer",
            parameters: json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "object",
                        "properties": {
                            "quality_score": score,
                            "strengths": list,
                            "areas_to_probe": list,
                            "summary": { "type": "string" }
                        },
                        "required": ["quality_score", "strengths", "areas_to_probe", "summary"]
                    },
                    "fluency": {
                        "type": "object",
                        "properties": {
                            "vocabulary_clarity": score,
                            "sentence_flow": score,
                            "hesitation": score,
                            "grammar": score,
                            "overall": score,
                            "notes": { "type": "string" }
                        },
                        "required": ["vocabulary_clarity", "sentence_flow", "hesitation", "grammar", "overall", "notes"]
                    }
                },
                "required": ["content", "fluency"]
            }),
        }
    }

    pub fn as_tool(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }

    pub fn as_choice(&self) -> Value {
        json!({ "type": "function", "function": { "name": self.name } })
    }
}
