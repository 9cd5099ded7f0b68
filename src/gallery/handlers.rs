use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::view::{self, GalleryPage, ResolvedMedia};
use super::{
    AdminGalleryQuery, Control, DeleteQuery, GalleryContext, GalleryError, PhotoEdit, PhotoUpload,
    PublicGalleryQuery, UploadQuery, ViewState, current_year,
};
use crate::AppState;
use crate::api::StatusResponse;
use crate::login::AdminSession;

const ADMIN_TEMPLATE: &str = include_str!("admin_gallery.html.liquid");

fn gallery_context(
    app_state: &AppState,
    context: &str,
) -> Result<Arc<GalleryContext>, GalleryError> {
    app_state
        .galleries
        .get(context)
        .cloned()
        .ok_or_else(|| GalleryError::UnknownContext(context.to_string()))
}

#[derive(Debug, Serialize)]
pub struct PublicPhoto {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub album: String,
    pub color_label: String,
    pub view_url: Option<String>,
    pub download_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicGalleryResponse {
    pub context: String,
    pub album: Option<String>,
    pub albums: Vec<String>,
    pub photos: Vec<PublicPhoto>,
}

/// Read-only gallery for visitors, optionally narrowed to one album.
pub async fn public_gallery_handler(
    State(app_state): State<AppState>,
    Path(context): Path<String>,
    Query(query): Query<PublicGalleryQuery>,
) -> Result<Json<PublicGalleryResponse>, GalleryError> {
    let gallery = gallery_context(&app_state, &context)?;
    let records = gallery.manager.records().await?;
    let media = view::resolve_media(gallery.manager.objects(), &records).await;

    let albums: BTreeSet<String> = records.iter().map(|r| r.album.clone()).collect();
    let page = view::render(&records, &media, None);
    let rows = view::filter_by_album(page.rows, query.album.as_deref());

    let photos = rows
        .into_iter()
        .filter(|row| !matches!(row.media, ResolvedMedia::Unavailable { .. }))
        .map(|row| PublicPhoto {
            view_url: row.media.view_url().map(str::to_string),
            download_url: row.media.download_url().map(str::to_string),
            id: row.id,
            title: row.title,
            year: row.year,
            album: row.album,
            color_label: row.color_label,
        })
        .collect();

    Ok(Json(PublicGalleryResponse {
        context,
        album: query.album,
        albums: albums.into_iter().collect(),
        photos,
    }))
}

#[derive(Debug, Serialize)]
pub struct AdminGalleryResponse {
    pub context: String,
    pub status: &'static str,
    pub revision: u64,
    pub message: Option<String>,
    pub page: Option<GalleryPage>,
    pub busy: Vec<&'static str>,
}

fn admin_view(gallery: &GalleryContext, editing: Option<&str>) -> AdminGalleryResponse {
    let state = gallery.live.current();
    let (status, message) = match state.as_ref() {
        ViewState::Loading => ("loading", None),
        ViewState::Ready { .. } => ("ready", None),
        ViewState::Failed { message } => ("failed", Some(message.clone())),
    };

    let busy = [Control::Upload, Control::Save, Control::Sync]
        .into_iter()
        .filter(|control| gallery.latch.is_busy(*control))
        .map(Control::label)
        .collect();

    AdminGalleryResponse {
        context: gallery.name.clone(),
        status,
        revision: state.revision(),
        message,
        page: state.render(editing),
        busy,
    }
}

/// Live admin view as JSON, rendered from the latest snapshot.
pub async fn admin_gallery_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
    Path(context): Path<String>,
    Query(query): Query<AdminGalleryQuery>,
) -> Result<Json<AdminGalleryResponse>, GalleryError> {
    let gallery = gallery_context(&app_state, &context)?;
    Ok(Json(admin_view(&gallery, query.edit.as_deref())))
}

/// Flattened row for the admin template; every key is always present.
#[derive(Debug, Serialize)]
struct TemplateRow {
    id: String,
    title: String,
    album: String,
    meta: String,
    view_url: Option<String>,
    unavailable: bool,
    is_editing: bool,
    actions: Vec<view::RowAction>,
}

pub async fn admin_gallery_page_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
    Path(context): Path<String>,
    Query(query): Query<AdminGalleryQuery>,
) -> Result<Html<String>, GalleryError> {
    let gallery = gallery_context(&app_state, &context)?;
    let view = admin_view(&gallery, query.edit.as_deref());

    let parser = liquid::ParserBuilder::with_stdlib()
        .build()
        .map_err(|e| GalleryError::Render(e.to_string()))?;
    let template = parser
        .parse(ADMIN_TEMPLATE)
        .map_err(|e| GalleryError::Render(e.to_string()))?;

    let (rows, edit_form) = match view.page {
        Some(page) => {
            let rows: Vec<TemplateRow> = page
                .rows
                .into_iter()
                .map(|row| TemplateRow {
                    view_url: row.media.view_url().map(str::to_string),
                    unavailable: matches!(row.media, ResolvedMedia::Unavailable { .. }),
                    id: row.id,
                    title: row.title,
                    album: row.album,
                    meta: row.meta,
                    is_editing: row.is_editing,
                    actions: row.actions,
                })
                .collect();
            (rows, page.edit_form)
        }
        None => (Vec::new(), None),
    };

    let globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "context": view.context,
        "status": view.status,
        "revision": view.revision,
        "message": view.message.unwrap_or_default(),
        "rows": rows,
        "is_empty": rows.is_empty(),
        "edit_form": edit_form,
        "current_year": current_year(),
        "upload_busy": view.busy.contains(&Control::Upload.label()),
        "save_busy": view.busy.contains(&Control::Save.label()),
        "sync_busy": view.busy.contains(&Control::Sync.label()),
    });

    template
        .render(&globals)
        .map(Html)
        .map_err(|e| GalleryError::Render(e.to_string()))
}

/// Uploads the request body as `file_name`, then records it.
pub async fn create_photo_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
    Path((context, file_name)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, GalleryError> {
    let gallery = gallery_context(&app_state, &context)?;
    let _guard = gallery
        .latch
        .try_acquire(Control::Upload)
        .ok_or(GalleryError::Busy(Control::Upload.label()))?;

    if body.is_empty() {
        return Err(GalleryError::InvalidInput("upload body is empty".to_string()));
    }

    let mut upload = PhotoUpload::new(file_name, body.to_vec());
    upload.title = query.title;
    upload.year = query.year;
    upload.album = query.album;
    upload.color_label = query.color_label;

    let created = gallery.manager.create(upload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_photo_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
    Path((context, id)): Path<(String, String)>,
    Json(edit): Json<PhotoEdit>,
) -> Result<Json<StatusResponse>, GalleryError> {
    let gallery = gallery_context(&app_state, &context)?;
    let _guard = gallery
        .latch
        .try_acquire(Control::Save)
        .ok_or(GalleryError::Busy(Control::Save.label()))?;

    gallery.manager.update(&id, edit).await?;
    Ok(Json(StatusResponse::ok("Photo updated.")))
}

/// Deletes the record as last seen by the live view, so the blobs removed are
/// the ones the admin was looking at. Records the view has not caught up with
/// yet are read from the store.
pub async fn delete_photo_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
    Path((context, id)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, GalleryError> {
    if !query.confirm {
        return Err(GalleryError::ConfirmationRequired);
    }

    let gallery = gallery_context(&app_state, &context)?;
    let record = match gallery.live.find_record(&id) {
        Some(record) => record,
        None => gallery
            .manager
            .find_record(&id)
            .await?
            .ok_or_else(|| GalleryError::NotFound(id.clone()))?,
    };

    debug!("[{}] Deleting {} ({})", context, id, record.original_path);
    let report = gallery.manager.delete(&record).await?;
    Ok(Json(report))
}

pub async fn sync_handler(
    _session: AdminSession,
    State(app_state): State<AppState>,
    Path(context): Path<String>,
) -> Result<impl IntoResponse, GalleryError> {
    let gallery = gallery_context(&app_state, &context)?;
    let _guard = gallery
        .latch
        .try_acquire(Control::Sync)
        .ok_or(GalleryError::Busy(Control::Sync.label()))?;

    info!("[{}] Sync requested", context);
    let report = gallery.manager.sync().await?;
    Ok(Json(report))
}
