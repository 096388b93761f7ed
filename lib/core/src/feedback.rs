//! User feedback on recommendations
//!
//! The engine only defines the record and the [`FeedbackSink`] seam; durable
//! storage belongs to whoever embeds it. [`MemoryFeedbackSink`] keeps records
//! in process and can export them as CSV.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

use crate::normalize::canonical;
use crate::{Error, Result};

/// One recommended item shown to a user, with their optional rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: String,
    pub category: Option<String>,
    pub base_type: Option<String>,
    pub selected_tags: Vec<String>,
    pub recommendation: String,
    pub rating: Option<u8>,
    #[serde(default)]
    pub purchased: bool,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(user_id: impl Into<String>, recommendation: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            category: None,
            base_type: None,
            selected_tags: Vec::new(),
            recommendation: recommendation.into(),
            rating: None,
            purchased: false,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_context(
        mut self,
        category: Option<String>,
        base_type: Option<String>,
        selected_tags: Vec<String>,
    ) -> Self {
        self.category = category;
        self.base_type = base_type;
        self.selected_tags = selected_tags;
        self
    }

    /// Attach a 1 to 5 rating
    pub fn with_rating(mut self, rating: u8) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidRating(rating));
        }
        self.rating = Some(rating);
        Ok(self)
    }

    #[must_use]
    pub fn with_purchased(mut self, purchased: bool) -> Self {
        self.purchased = purchased;
        self
    }

    /// One unrated record per recommended item
    pub fn for_recommendations<'a, I>(
        user_id: &str,
        category: Option<&str>,
        base_type: Option<&str>,
        selected_tags: &[String],
        recommendations: I,
    ) -> Vec<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        recommendations
            .into_iter()
            .map(|name| {
                Self::new(user_id, name).with_context(
                    category.map(str::to_string),
                    base_type.map(str::to_string),
                    selected_tags.to_vec(),
                )
            })
            .collect()
    }
}

/// Short anonymous user id (first 8 hex digits of a v4 UUID)
pub fn new_user_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Destination for feedback records
pub trait FeedbackSink: Send + Sync {
    fn record(&self, record: FeedbackRecord) -> Result<()>;

    fn record_all(&self, records: Vec<FeedbackRecord>) -> Result<usize> {
        let count = records.len();
        for record in records {
            self.record(record)?;
        }
        Ok(count)
    }

    /// Write collected records as CSV; sinks that only forward records refuse
    fn export_csv(&self, _writer: &mut dyn Write) -> Result<()> {
        Err(Error::Feedback("this sink does not support export".to_string()))
    }
}

/// In-process feedback store
///
/// Unbounded unless built with [`MemoryFeedbackSink::with_limit`], which keeps
/// only the most recent `limit` records. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryFeedbackSink {
    records: RwLock<Vec<FeedbackRecord>>,
    limit: Option<usize>,
}

impl MemoryFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain at most `limit` records, dropping the oldest first
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            limit: Some(limit),
        }
    }

    /// Remove and return every collected record
    pub fn drain(&self) -> Vec<FeedbackRecord> {
        std::mem::take(&mut *self.records.write())
    }

    pub fn records(&self) -> Vec<FeedbackRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Write every record as CSV, header first
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record([
            "User ID",
            "Category",
            "Base Type",
            "Selected Tags",
            "Recommendation",
            "Rating",
            "Purchased",
            "Created At",
        ])?;

        for record in self.records.read().iter() {
            writer.write_record([
                record.user_id.as_str(),
                record.category.as_deref().unwrap_or_default(),
                record.base_type.as_deref().unwrap_or_default(),
                canonical(&record.selected_tags).as_str(),
                record.recommendation.as_str(),
                record.rating.map(|r| r.to_string()).unwrap_or_default().as_str(),
                if record.purchased { "Yes" } else { "No" },
                record.created_at.to_rfc3339().as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl FeedbackSink for MemoryFeedbackSink {
    fn record(&self, record: FeedbackRecord) -> Result<()> {
        let mut records = self.records.write();
        records.push(record);
        if let Some(limit) = self.limit {
            if records.len() > limit {
                let excess = records.len() - limit;
                records.drain(..excess);
            }
        }
        Ok(())
    }

    fn export_csv(&self, writer: &mut dyn Write) -> Result<()> {
        self.write_csv(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_shape() {
        let id = new_user_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_user_id());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(FeedbackRecord::new("u1", "Mango Tea").with_rating(5).is_ok());
        assert!(matches!(
            FeedbackRecord::new("u1", "Mango Tea").with_rating(0),
            Err(Error::InvalidRating(0))
        ));
        assert!(FeedbackRecord::new("u1", "Mango Tea").with_rating(6).is_err());
    }

    #[test]
    fn test_one_record_per_recommendation() {
        let tags = vec!["mango".to_string()];
        let records = FeedbackRecord::for_recommendations(
            "u1",
            Some("Fruit Tea"),
            Some("Green Tea"),
            &tags,
            ["Mango Tea", "Passion Fruit Tea"],
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].recommendation, "Passion Fruit Tea");
        assert_eq!(records[1].selected_tags, tags);
        assert!(records.iter().all(|r| r.rating.is_none()));
    }

    #[test]
    fn test_memory_sink_csv_export() {
        let sink = MemoryFeedbackSink::new();
        let tags = vec!["fruity".to_string(), "mango".to_string()];
        sink.record_all(FeedbackRecord::for_recommendations(
            "u1",
            Some("Fruit Tea"),
            None,
            &tags,
            ["Mango Tea"],
        ))
        .unwrap();
        sink.record(
            FeedbackRecord::new("u2", "Thai Milk Tea")
                .with_rating(4)
                .unwrap()
                .with_purchased(true),
        )
        .unwrap();
        assert_eq!(sink.len(), 2);

        let mut out = Vec::new();
        sink.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("User ID,Category,Base Type"));
        assert!(lines[1].starts_with("u1,Fruit Tea,,\"fruity, mango\",Mango Tea,,No,"));
        assert!(lines[2].starts_with("u2,,,,Thai Milk Tea,4,Yes,"));
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let sink = MemoryFeedbackSink::with_limit(2);
        for name in ["Mango Tea", "Taro Slush", "Peach Oolong"] {
            sink.record(FeedbackRecord::new("u1", name)).unwrap();
        }
        let kept: Vec<_> = sink.records().into_iter().map(|r| r.recommendation).collect();
        assert_eq!(kept, vec!["Taro Slush", "Peach Oolong"]);
    }

    #[test]
    fn test_drain_empties_sink() {
        let sink = MemoryFeedbackSink::new();
        sink.record(FeedbackRecord::new("u1", "Mango Tea")).unwrap();
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.is_empty());
    }
}
