//! Similarity retrieval over a speaker's chat history.
//!
//! # Algorithm
//!
//! 1. Pick the reference set according to [`ReferenceStrategy`].
//! 2. Fit a TF-IDF space on the reference set (rebuilt per call).
//! 3. Score every reference message by cosine similarity to the query.
//! 4. Sort by score (desc), then corpus position (asc).
//! 5. Take the top `top_n` and resolve each to an output message.
//!
//! With [`ReferenceStrategy::SpeakerHistory`] the output is the matched
//! speaker message itself. With [`ReferenceStrategy::ReplyFollowing`] the
//! query is matched against the other participants' lines and the output
//! is the target speaker's next message after each match, i.e. what the
//! speaker said in reply to a similar past line.

use serde::{Deserialize, Serialize};

use crate::models::ChatMessage;
use crate::tfidf::{cosine_similarity, TfidfVectorizer};

/// Which messages a query is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceStrategy {
    /// Compare against the target speaker's own messages.
    #[default]
    #[serde(rename = "speaker")]
    SpeakerHistory,
    /// Compare against other participants and return the speaker's reply.
    #[serde(rename = "reply")]
    ReplyFollowing,
}

impl std::str::FromStr for ReferenceStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "speaker" => Ok(ReferenceStrategy::SpeakerHistory),
            "reply" => Ok(ReferenceStrategy::ReplyFollowing),
            other => anyhow::bail!(
                "Unknown retrieval strategy: '{}'. Use speaker or reply.",
                other
            ),
        }
    }
}

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalParams {
    pub strategy: ReferenceStrategy,
    /// Maximum number of messages to return.
    pub top_n: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            strategy: ReferenceStrategy::SpeakerHistory,
            top_n: 5,
        }
    }
}

/// A retrieved message with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedMessage {
    /// The message to place in the prompt.
    pub text: String,
    /// Cosine similarity of the matched reference line, in `[0, 1]`.
    pub score: f64,
    /// The reference line that scored. Same as `text` for speaker history.
    pub matched: String,
}

/// Retrieve up to `params.top_n` messages for `query`.
pub fn retrieve(
    corpus: &[ChatMessage],
    speaker: &str,
    query: &str,
    params: &RetrievalParams,
) -> Vec<String> {
    retrieve_scored(corpus, speaker, query, params)
        .into_iter()
        .map(|r| r.text)
        .collect()
}

/// Like [`retrieve`], keeping scores and matched lines.
pub fn retrieve_scored(
    corpus: &[ChatMessage],
    speaker: &str,
    query: &str,
    params: &RetrievalParams,
) -> Vec<RetrievedMessage> {
    if params.top_n == 0 {
        return Vec::new();
    }

    let has_speaker = corpus.iter().any(|m| m.speaker == speaker);
    if !has_speaker {
        return Vec::new();
    }

    // Positions in `corpus` of the reference messages.
    let reference: Vec<usize> = corpus
        .iter()
        .enumerate()
        .filter(|(_, m)| match params.strategy {
            ReferenceStrategy::SpeakerHistory => m.speaker == speaker,
            ReferenceStrategy::ReplyFollowing => m.speaker != speaker,
        })
        .map(|(i, _)| i)
        .collect();

    if reference.is_empty() {
        return Vec::new();
    }

    let docs: Vec<&str> = reference.iter().map(|&i| corpus[i].text.as_str()).collect();
    let (vectorizer, vectors) = TfidfVectorizer::fit_transform(&docs);
    let query_vec = vectorizer.transform(query);

    let mut scored: Vec<(usize, f64)> = reference
        .iter()
        .zip(vectors.iter())
        .map(|(&pos, v)| (pos, cosine_similarity(&query_vec, v)))
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(params.top_n);

    scored
        .into_iter()
        .filter_map(|(pos, score)| {
            let matched = &corpus[pos];
            let text = match params.strategy {
                ReferenceStrategy::SpeakerHistory => matched.text.clone(),
                ReferenceStrategy::ReplyFollowing => next_reply(corpus, pos, speaker)?,
            };
            Some(RetrievedMessage {
                text,
                score,
                matched: matched.text.clone(),
            })
        })
        .collect()
}

/// First message by `speaker` after corpus position `pos`.
fn next_reply(corpus: &[ChatMessage], pos: usize, speaker: &str) -> Option<String> {
    corpus[pos + 1..]
        .iter()
        .find(|m| m.speaker == speaker)
        .map(|m| m.text.clone())
}
