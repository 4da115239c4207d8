use crate::domain::symbol::CanonicalSymbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// UI entry point a symbol was queued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueSource {
    Swipe,
    Manual,
    Search,
    Bulk,
    Influencer,
    Agent,
}

impl QueueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swipe => "swipe",
            Self::Manual => "manual",
            Self::Search => "search",
            Self::Bulk => "bulk",
            Self::Influencer => "influencer",
            Self::Agent => "agent",
        }
    }
}

impl fmt::Display for QueueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "swipe" => Ok(Self::Swipe),
            "manual" => Ok(Self::Manual),
            "search" => Ok(Self::Search),
            "bulk" => Ok(Self::Bulk),
            "influencer" => Ok(Self::Influencer),
            "agent" => Ok(Self::Agent),
            other => Err(format!("unknown queue source: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sentiment {
    Conservative,
    Bullish,
    VeryBullish,
    Bearish,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Bullish => "bullish",
            Self::VeryBullish => "very-bullish",
            Self::Bearish => "bearish",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "conservative" => Ok(Self::Conservative),
            "bullish" => Ok(Self::Bullish),
            "very-bullish" => Ok(Self::VeryBullish),
            "bearish" => Ok(Self::Bearish),
            other => Err(format!("unknown sentiment: {other}")),
        }
    }
}

/// Optional context attached to an insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMetadata {
    pub source: Option<QueueSource>,
    pub sentiment: Option<Sentiment>,
}

impl QueueMetadata {
    pub fn from_source(source: QueueSource) -> Self {
        Self {
            source: Some(source),
            sentiment: None,
        }
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: String,
    pub symbol: CanonicalSymbol,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<QueueSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

/// Persisted shape of a [`QueueItem`]. The symbol is kept raw and goes back
/// through canonicalization when the queue is hydrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredQueueItem {
    pub id: String,
    pub symbol: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<QueueSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl From<&QueueItem> for StoredQueueItem {
    fn from(item: &QueueItem) -> Self {
        Self {
            id: item.id.clone(),
            symbol: item.symbol.to_string(),
            added_at: item.added_at,
            source: item.source,
            sentiment: item.sentiment,
        }
    }
}
