//! Rendering of the gallery list and per-row URL resolution.
//!
//! Rendering is a pure function of the latest record snapshot, the media
//! resolved so far, and which record (if any) is being edited. Each action
//! carries the id it applies to, so a row never acts on a stale record.

use serde::Serialize;
use std::collections::HashMap;
use tokio::task::JoinSet;
use tracing::debug;

use super::types::PhotoRecord;
use crate::storage::{DynObjectStore, ObjectStore};

/// Browsable URLs for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolvedMedia {
    /// Not resolved yet.
    Pending,
    /// The derived rendition exists.
    Standard {
        view_url: String,
        download_url: Option<String>,
    },
    /// No rendition; the original is shown instead.
    Original {
        view_url: String,
        download_url: String,
    },
    Unavailable {
        reason: String,
    },
}

impl ResolvedMedia {
    pub fn view_url(&self) -> Option<&str> {
        match self {
            ResolvedMedia::Standard { view_url, .. } | ResolvedMedia::Original { view_url, .. } => {
                Some(view_url.as_str())
            }
            _ => None,
        }
    }

    pub fn download_url(&self) -> Option<&str> {
        match self {
            ResolvedMedia::Standard { download_url, .. } => download_url.as_deref(),
            ResolvedMedia::Original { download_url, .. } => Some(download_url.as_str()),
            _ => None,
        }
    }
}

/// Standard rendition first, then the original, then an error marker.
/// Never fails.
pub async fn resolve_one(objects: &dyn ObjectStore, record: &PhotoRecord) -> ResolvedMedia {
    let original = objects.resolve_url(&record.original_path).await;

    match objects.resolve_url(&record.standard_path).await {
        Ok(view_url) => ResolvedMedia::Standard {
            view_url,
            download_url: original.ok(),
        },
        Err(standard_err) => match original {
            Ok(url) => {
                debug!(
                    "Rendition {} unavailable ({}), using original",
                    record.standard_path, standard_err
                );
                ResolvedMedia::Original {
                    view_url: url.clone(),
                    download_url: url,
                }
            }
            Err(original_err) => ResolvedMedia::Unavailable {
                reason: format!("{}; {}", standard_err, original_err),
            },
        },
    }
}

/// Starts one resolution task per record. Tasks finish independently, so a
/// slow or failing row never holds back the others.
pub fn spawn_resolution(
    objects: &DynObjectStore,
    records: &[PhotoRecord],
) -> JoinSet<(String, ResolvedMedia)> {
    let mut tasks = JoinSet::new();
    for record in records {
        let objects = objects.clone();
        let record = record.clone();
        tasks.spawn(async move {
            let media = resolve_one(objects.as_ref(), &record).await;
            (record.id, media)
        });
    }
    tasks
}

/// Resolves all rows and waits for every one of them.
pub async fn resolve_media(
    objects: &DynObjectStore,
    records: &[PhotoRecord],
) -> HashMap<String, ResolvedMedia> {
    let mut tasks = spawn_resolution(objects, records);
    let mut media = HashMap::with_capacity(records.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, resolved)) => {
                media.insert(id, resolved);
            }
            Err(e) => tracing::error!("URL resolution task failed: {}", e),
        }
    }
    media
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    View,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowAction {
    pub kind: ActionKind,
    pub record_id: String,
    pub requires_confirmation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryRow {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub album: String,
    pub color_label: String,
    pub order: i64,
    pub meta: String,
    pub media: ResolvedMedia,
    pub actions: Vec<RowAction>,
    pub is_editing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditForm {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub order: i64,
    pub album: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryPage {
    pub rows: Vec<GalleryRow>,
    pub edit_form: Option<EditForm>,
    pub is_empty: bool,
}

pub fn render(
    records: &[PhotoRecord],
    media: &HashMap<String, ResolvedMedia>,
    editing: Option<&str>,
) -> GalleryPage {
    let rows: Vec<GalleryRow> = records
        .iter()
        .map(|record| render_row(record, media.get(&record.id), editing))
        .collect();

    let edit_form = editing
        .and_then(|id| records.iter().find(|r| r.id == id))
        .map(|record| EditForm {
            id: record.id.clone(),
            title: record.title.clone(),
            year: record.year,
            order: record.order,
            album: record.album.clone(),
        });

    GalleryPage {
        is_empty: rows.is_empty(),
        rows,
        edit_form,
    }
}

fn render_row(
    record: &PhotoRecord,
    media: Option<&ResolvedMedia>,
    editing: Option<&str>,
) -> GalleryRow {
    let action = |kind, requires_confirmation| RowAction {
        kind,
        record_id: record.id.clone(),
        requires_confirmation,
    };

    GalleryRow {
        id: record.id.clone(),
        title: record.title.clone(),
        year: record.year,
        album: record.album.clone(),
        color_label: record.color_label.clone(),
        order: record.order,
        meta: meta_line(record),
        media: media.cloned().unwrap_or(ResolvedMedia::Pending),
        actions: vec![
            action(ActionKind::View, false),
            action(ActionKind::Edit, false),
            action(ActionKind::Delete, true),
        ],
        is_editing: editing == Some(record.id.as_str()),
    }
}

/// `2024 · warm`, skipping empty parts.
fn meta_line(record: &PhotoRecord) -> String {
    let year = record.year.to_string();
    [year.as_str(), record.color_label.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Album chip filtering for the public gallery; `all` keeps every row.
pub fn filter_by_album(rows: Vec<GalleryRow>, album: Option<&str>) -> Vec<GalleryRow> {
    match album {
        None | Some("all") | Some("") => rows,
        Some(slug) => rows.into_iter().filter(|row| row.album == slug).collect(),
    }
}
