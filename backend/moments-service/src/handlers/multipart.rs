/// Multipart form parsing for post create/edit requests
///
/// Create reads `familyId`, `content` and repeated `imgs` files. Edit reads an
/// optional `content` and per-slot files `img1`..`img4`.
use crate::error::{AppError, Result};
use crate::models::{CreatePostRequest, EditPostRequest, MAX_IMAGES};
use actix_multipart::Multipart;
use futures_util::stream::StreamExt;
use image_store::ImagePayload;

#[derive(Debug, Default)]
pub struct PostForm {
    pub family_id: Option<i64>,
    pub content: Option<String>,
    /// `imgs` parts in the order they were sent
    pub images: Vec<ImagePayload>,
    /// `img1`..`img4` parts, by slot
    pub slots: [Option<ImagePayload>; MAX_IMAGES],
}

impl PostForm {
    pub fn into_create_request(self) -> Result<CreatePostRequest> {
        let family_id = self
            .family_id
            .ok_or_else(|| AppError::BadRequest("familyId is required".into()))?;
        let content = self
            .content
            .ok_or_else(|| AppError::BadRequest("content is required".into()))?;

        Ok(CreatePostRequest {
            family_id,
            content,
            images: self.images,
        })
    }

    pub fn into_edit_request(self) -> EditPostRequest {
        EditPostRequest {
            content: self.content,
            images: self.slots.into_iter().collect(),
        }
    }
}

/// Parts accepted in a single form before the request is rejected
pub const MAX_FORM_PARTS: usize = 16;

/// What to do with a part, decided from its name before any bytes are read
enum PartTarget {
    FamilyId,
    Content,
    Image,
    Slot(usize),
    Skip,
}

/// Drain the multipart stream into a `PostForm`.
///
/// Each part is capped at `max_part_bytes` and buffered image bytes at
/// `MAX_IMAGES * max_part_bytes`. `imgs` parts past the fourth and unknown
/// fields are drained without being kept.
pub async fn read_post_form(mut payload: Multipart, max_part_bytes: usize) -> Result<PostForm> {
    let mut form = PostForm::default();
    let max_image_total = MAX_IMAGES * max_part_bytes;
    let mut image_total = 0usize;
    let mut parts = 0usize;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        parts += 1;
        if parts > MAX_FORM_PARTS {
            return Err(AppError::BadRequest(format!(
                "Form has more than {} parts",
                MAX_FORM_PARTS
            )));
        }

        let name = field.name().unwrap_or_default().to_string();
        let target = match name.as_str() {
            "familyId" => PartTarget::FamilyId,
            "content" => PartTarget::Content,
            "imgs" if form.images.len() < MAX_IMAGES => PartTarget::Image,
            other => image_slot(other).map_or(PartTarget::Skip, PartTarget::Slot),
        };

        if let PartTarget::Skip = target {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::BadRequest(format!("Multipart read error: {}", e)))?;
            }
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());
        let is_image = matches!(target, PartTarget::Image | PartTarget::Slot(_));

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Multipart read error: {}", e)))?;
            if data.len() + chunk.len() > max_part_bytes {
                return Err(AppError::BadRequest(format!(
                    "Part '{}' exceeds {} bytes",
                    name, max_part_bytes
                )));
            }
            if is_image {
                image_total += chunk.len();
                if image_total > max_image_total {
                    return Err(AppError::BadRequest(format!(
                        "Images exceed {} bytes in total",
                        max_image_total
                    )));
                }
            }
            data.extend_from_slice(&chunk);
        }

        match target {
            PartTarget::FamilyId => {
                let text = text_value(&name, data)?;
                let family_id = text.trim().parse().map_err(|_| {
                    AppError::BadRequest(format!("familyId '{}' is not a number", text))
                })?;
                form.family_id = Some(family_id);
            }
            PartTarget::Content => form.content = Some(text_value(&name, data)?),
            PartTarget::Image => {
                if let Some(image) = image_value(file_name, content_type, data) {
                    form.images.push(image);
                }
            }
            PartTarget::Slot(slot) => {
                form.slots[slot] = image_value(file_name, content_type, data);
            }
            PartTarget::Skip => {}
        }
    }

    Ok(form)
}

fn text_value(name: &str, data: Vec<u8>) -> Result<String> {
    String::from_utf8(data).map_err(|_| AppError::BadRequest(format!("{} must be UTF-8", name)))
}

/// Browsers send an empty part for an unselected file input; that is not an image.
fn image_value(
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
) -> Option<ImagePayload> {
    if data.is_empty() {
        return None;
    }

    Some(ImagePayload::new(
        file_name.unwrap_or_else(|| "image".to_string()),
        content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        data,
    ))
}

/// `img1`..`img4` to slot 0..3
fn image_slot(field_name: &str) -> Option<usize> {
    field_name
        .strip_prefix("img")
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| (1..=MAX_IMAGES).contains(n))
        .map(|n| n - 1)
}
