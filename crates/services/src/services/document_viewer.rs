//! Resolves stored documents into something a browser can render: a public
//! URL plus a category deciding between inline preview, external office
//! viewer, and plain download.

use db::models::document::TenderDocument;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use ts_rs::TS;
use url::Url;

const OFFICE_VIEWER_URL: &str = "https://view.officeapps.live.com/op/view.aspx";

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("invalid public base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// How the frontend should render a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentCategory {
    Pdf,
    Image,
    Video,
    Audio,
    Spreadsheet,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DocumentViewResponse {
    pub category: DocumentCategory,
    /// Direct URL to the stored bytes; always usable for download.
    pub download_url: String,
    /// Inline preview URL. None for spreadsheets and uncategorized files,
    /// which the frontend sends to viewer_url or the download button instead.
    pub preview_url: Option<String>,
    /// External office viewer URL, set for spreadsheets only.
    pub viewer_url: Option<String>,
}

/// MIME-based category routing. Unknown and missing types fall back to Other.
pub fn categorize(mime_type: Option<&str>, file_name: &str) -> DocumentCategory {
    let mime = mime_type
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
        .to_ascii_lowercase();
    // browsers may append parameters ("text/csv; charset=utf-8")
    let mime = mime.split(';').next().unwrap_or_default().trim();

    if mime == "application/pdf" {
        DocumentCategory::Pdf
    } else if mime.starts_with("image/") {
        DocumentCategory::Image
    } else if mime.starts_with("video/") {
        DocumentCategory::Video
    } else if mime.starts_with("audio/") {
        DocumentCategory::Audio
    } else if is_spreadsheet_mime(mime) {
        DocumentCategory::Spreadsheet
    } else {
        DocumentCategory::Other
    }
}

fn is_spreadsheet_mime(mime: &str) -> bool {
    matches!(
        mime,
        "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.oasis.opendocument.spreadsheet"
            | "text/csv"
    )
}

#[derive(Debug, Clone)]
pub struct DocumentViewerService {
    public_base_url: String,
}

impl DocumentViewerService {
    pub fn new(public_base_url: String) -> Self {
        Self { public_base_url }
    }

    /// Public URL for a stored object, served by the /files route. The base
    /// must end in a slash or Url::join would replace its last path segment.
    pub fn public_url(&self, storage_path: &str) -> Result<String, ViewerError> {
        let mut base = self.public_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;
        let url = base.join(&format!("files/{storage_path}"))?;
        Ok(url.to_string())
    }

    /// Build the view response for a document. Spreadsheets get the external
    /// office viewer; pdf/image/video/audio preview inline; everything else
    /// is download-only.
    pub fn view(&self, document: &TenderDocument) -> Result<DocumentViewResponse, ViewerError> {
        let category = categorize(document.mime_type.as_deref(), &document.file_name);
        let download_url = self.public_url(&document.storage_path)?;

        let (preview_url, viewer_url) = match category {
            DocumentCategory::Spreadsheet => {
                let mut viewer = Url::parse(OFFICE_VIEWER_URL)?;
                viewer.query_pairs_mut().append_pair("src", &download_url);
                (None, Some(viewer.to_string()))
            }
            DocumentCategory::Other => (None, None),
            _ => (Some(download_url.clone()), None),
        };

        Ok(DocumentViewResponse {
            category,
            download_url,
            preview_url,
            viewer_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn document(file_name: &str, mime_type: Option<&str>) -> TenderDocument {
        TenderDocument {
            id: Uuid::new_v4(),
            tender_id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            mime_type: mime_type.map(str::to_string),
            size_bytes: 1,
            storage_path: format!("abc/{file_name}"),
            uploaded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn mime_category_routing() {
        assert_eq!(
            categorize(Some("application/pdf"), "x.pdf"),
            DocumentCategory::Pdf
        );
        assert_eq!(categorize(Some("image/png"), "x.png"), DocumentCategory::Image);
        assert_eq!(categorize(Some("video/mp4"), "x.mp4"), DocumentCategory::Video);
        assert_eq!(
            categorize(Some("audio/mpeg"), "x.mp3"),
            DocumentCategory::Audio
        );
        assert_eq!(
            categorize(
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
                "boq.xlsx"
            ),
            DocumentCategory::Spreadsheet
        );
        assert_eq!(
            categorize(Some("application/zip"), "x.zip"),
            DocumentCategory::Other
        );
        // missing MIME falls back to the file extension
        assert_eq!(categorize(None, "scan.jpeg"), DocumentCategory::Image);
        assert_eq!(categorize(None, "mystery.bin"), DocumentCategory::Other);
    }

    #[test]
    fn mime_parameters_are_ignored() {
        assert_eq!(
            categorize(Some("text/csv; charset=utf-8"), "rates.csv"),
            DocumentCategory::Spreadsheet
        );
        assert_eq!(
            categorize(Some("application/pdf;name=bid.pdf"), "bid.pdf"),
            DocumentCategory::Pdf
        );
    }

    #[test]
    fn spreadsheets_get_the_office_viewer_not_an_inline_preview() {
        let service = DocumentViewerService::new("http://localhost:8911".to_string());
        let response = service
            .view(&document(
                "boq.xlsx",
                Some("application/vnd.ms-excel"),
            ))
            .unwrap();
        assert_eq!(response.category, DocumentCategory::Spreadsheet);
        assert!(response.preview_url.is_none());
        let viewer = response.viewer_url.unwrap();
        assert!(viewer.starts_with(OFFICE_VIEWER_URL));
        assert!(viewer.contains("src="));
    }

    #[test]
    fn pdfs_preview_inline() {
        let service = DocumentViewerService::new("http://localhost:8911".to_string());
        let response = service
            .view(&document("bid.pdf", Some("application/pdf")))
            .unwrap();
        assert_eq!(response.category, DocumentCategory::Pdf);
        assert_eq!(response.preview_url.as_deref(), Some(response.download_url.as_str()));
        assert!(response.viewer_url.is_none());
    }

    #[test]
    fn public_url_joins_base_and_path() {
        let service = DocumentViewerService::new("http://localhost:8911".to_string());
        assert_eq!(
            service.public_url("abc/bid.pdf").unwrap(),
            "http://localhost:8911/files/abc/bid.pdf"
        );
    }

    #[test]
    fn public_url_keeps_a_base_path_without_trailing_slash() {
        for base in ["http://host/app", "http://host/app/"] {
            let service = DocumentViewerService::new(base.to_string());
            assert_eq!(
                service.public_url("abc/bid.pdf").unwrap(),
                "http://host/app/files/abc/bid.pdf"
            );
        }
    }
}
