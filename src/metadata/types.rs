use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Raw fields of a page or theme document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// One uploaded photo. Paths and `created_at` never change after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub album: String,
    #[serde(default)]
    pub color_label: String,
    pub original_path: String,
    pub standard_path: String,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

/// A record before the store has assigned its id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPhoto {
    pub title: String,
    pub year: i32,
    pub album: String,
    pub color_label: String,
    pub original_path: String,
    pub standard_path: String,
    pub order: i64,
}

impl NewPhoto {
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> PhotoRecord {
        PhotoRecord {
            id,
            title: self.title,
            year: self.year,
            album: self.album,
            color_label: self.color_label,
            original_path: self.original_path,
            standard_path: self.standard_path,
            order: self.order,
            created_at,
        }
    }
}

/// Partial update restricted to the mutable fields of a [`PhotoRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

impl PhotoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.year.is_none() && self.order.is_none() && self.album.is_none()
    }

    pub fn apply(&self, record: &mut PhotoRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(year) = self.year {
            record.year = year;
        }
        if let Some(order) = self.order {
            record.order = order;
        }
        if let Some(album) = &self.album {
            record.album = album.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionKey(String);

impl CollectionKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Photo collection of a gallery context, nested under `pages`.
    pub fn for_context(context: &str) -> Self {
        Self(format!("pages/{}/{}", context, context))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Year,
    Order,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoQuery {
    pub collection: CollectionKey,
    pub year: Option<i32>,
    pub order_by: Vec<OrderBy>,
}

impl PhotoQuery {
    pub fn all(collection: CollectionKey) -> Self {
        Self {
            collection,
            year: None,
            order_by: Vec::new(),
        }
    }

    pub fn where_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn order_by(mut self, field: SortField, direction: Direction) -> Self {
        self.order_by.push(OrderBy { field, direction });
        self
    }

    pub fn matches(&self, record: &PhotoRecord) -> bool {
        self.year.is_none_or(|year| record.year == year)
    }

    /// Sorts by the requested keys; ties fall back to creation time, then id,
    /// so snapshots are deterministic.
    pub fn sort(&self, records: &mut [PhotoRecord]) {
        records.sort_by(|a, b| {
            for key in &self.order_by {
                let ordering = match key.field {
                    SortField::Year => a.year.cmp(&b.year),
                    SortField::Order => a.order.cmp(&b.order),
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                };
                let ordering = match key.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, year: i32, order: i64) -> PhotoRecord {
        PhotoRecord {
            id: id.to_string(),
            title: id.to_string(),
            year,
            album: "general".to_string(),
            color_label: String::new(),
            original_path: format!("image/{}.jpg", id),
            standard_path: format!("image/webp/{}_2048x2048.webp", id),
            order,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_collection_key_for_context() {
        assert_eq!(CollectionKey::for_context("inside").as_str(), "pages/inside/inside");
    }

    #[test]
    fn test_query_sorts_year_desc_then_order() {
        let query = PhotoQuery::all(CollectionKey::for_context("inside"))
            .order_by(SortField::Year, Direction::Descending)
            .order_by(SortField::Order, Direction::Ascending);

        let mut records = vec![record("a", 2022, 0), record("b", 2024, 3), record("c", 2024, 1)];
        query.sort(&mut records);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_query_year_filter() {
        let query = PhotoQuery::all(CollectionKey::for_context("inside")).where_year(2024);
        assert!(query.matches(&record("a", 2024, 0)));
        assert!(!query.matches(&record("b", 2023, 0)));
    }

    #[test]
    fn test_patch_only_touches_mutable_fields() {
        let mut photo = record("a", 2024, 0);
        let before = photo.clone();

        let patch = PhotoPatch {
            order: Some(5),
            ..Default::default()
        };
        patch.apply(&mut photo);

        assert_eq!(photo.order, 5);
        assert_eq!(photo.title, before.title);
        assert_eq!(photo.original_path, before.original_path);
        assert_eq!(photo.created_at, before.created_at);
        assert!(!patch.is_empty());
        assert!(PhotoPatch::default().is_empty());
    }
}
