use attache_core::{Attachment, Category, FileHandle};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{AttachmentPage, AttachmentService, ListFilter, Pagination, ServiceError};

const LIST_ATTACHMENTS_QUERY: &str = r#"
query AttachmentList($filters: [Filter], $pagination: Pagination) {
  attachments(filters: $filters, pagination: $pagination) {
    items {
      id
      name
      description
      mimetype
      encoding
      category
      path
      createdAt
      updatedAt
    }
    total
  }
}
"#;

const CREATE_ATTACHMENTS_MUTATION: &str = r#"
mutation($attachments: [NewAttachment]!) {
  createAttachments(attachments: $attachments) {
    id
    name
    description
    mimetype
    encoding
    category
    path
    createdAt
    updatedAt
  }
}
"#;

const DELETE_ATTACHMENT_MUTATION: &str = r#"
mutation DeleteAttachment($id: String!) {
  deleteAttachment(id: $id) {
    id
    name
    description
    mimetype
    encoding
    category
    path
    createdAt
    updatedAt
  }
}
"#;

/// GraphQL-over-HTTP client implementation of AttachmentService.
/// File creation uses the multipart upload convention: an `operations`
/// descriptor, a part-index-to-variable `map`, and one binary part per
/// file.
pub struct HttpService {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AttachmentsData {
    attachments: AttachmentPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAttachmentsData {
    create_attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteAttachmentData {
    delete_attachment: Attachment,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    async fn post_query<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ServiceError> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }
}

/// Build the `operations` multipart part: the mutation plus its
/// variables, with a null placeholder where each file will be attached.
fn multipart_operations(category: &Category, file_count: usize) -> serde_json::Value {
    let attachments: Vec<serde_json::Value> = (0..file_count)
        .map(|_| serde_json::json!({ "category": category, "file": null }))
        .collect();
    serde_json::json!({
        "query": CREATE_ATTACHMENTS_MUTATION,
        "variables": { "attachments": attachments },
    })
}

/// Build the `map` multipart part associating each transmitted part index
/// with the variable path it fills.
fn multipart_map(file_count: usize) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = (0..file_count)
        .map(|i| {
            (
                i.to_string(),
                serde_json::json!([format!("variables.attachments.{i}.file")]),
            )
        })
        .collect();
    serde_json::Value::Object(map)
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(error_for_status(status, resp).await);
    }
    let body: GraphQlResponse<T> = resp
        .json()
        .await
        .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))?;
    if let Some(err) = body.errors.first() {
        return Err(graphql_error(&err.message));
    }
    body.data
        .ok_or_else(|| ServiceError::Internal("missing data in response".into()))
}

fn graphql_error(message: &str) -> ServiceError {
    if message.to_ascii_lowercase().contains("not found") {
        ServiceError::NotFound(message.to_string())
    } else {
        ServiceError::Internal(message.to_string())
    }
}

async fn error_for_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v["errors"][0]["message"]
                .as_str()
                .map(String::from)
        })
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound(msg)
    } else if status == StatusCode::BAD_REQUEST {
        ServiceError::InvalidInput(msg)
    } else {
        ServiceError::Internal(msg)
    }
}

#[async_trait]
impl AttachmentService for HttpService {
    async fn list_attachments(
        &self,
        filter: &ListFilter,
        pagination: &Pagination,
    ) -> Result<AttachmentPage, ServiceError> {
        let mut filters = Vec::new();
        if let Some(category) = filter.category.as_ref().filter(|c| !c.is_none()) {
            filters.push(serde_json::json!({
                "name": "category",
                "operator": "eq",
                "value": category,
            }));
        }
        debug!(
            page = pagination.page,
            limit = pagination.limit,
            filtered = !filters.is_empty(),
            "listing attachments"
        );
        let variables = serde_json::json!({
            "filters": filters,
            "pagination": pagination,
        });
        let data: AttachmentsData = self.post_query(LIST_ATTACHMENTS_QUERY, variables).await?;
        Ok(data.attachments)
    }

    async fn create_attachments(
        &self,
        category: &Category,
        files: &[FileHandle],
    ) -> Result<Vec<Attachment>, ServiceError> {
        if files.is_empty() {
            return Err(ServiceError::InvalidInput("no files to upload".into()));
        }
        debug!(count = files.len(), category = %category, "uploading attachments");

        let mut form = Form::new()
            .text("operations", multipart_operations(category, files.len()).to_string())
            .text("map", multipart_map(files.len()).to_string());
        for (i, file) in files.iter().enumerate() {
            let part = Part::bytes(file.content.to_vec())
                .file_name(file.name.clone())
                .mime_str(&file.mimetype)
                .map_err(|e| ServiceError::InvalidInput(format!("bad mimetype: {e}")))?;
            form = form.part(i.to_string(), part);
        }

        let resp = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let data: CreateAttachmentsData = handle_response(resp).await?;
        Ok(data.create_attachments)
    }

    async fn delete_attachment(&self, id: &str) -> Result<Attachment, ServiceError> {
        debug!(id, "deleting attachment");
        let data: DeleteAttachmentData = self
            .post_query(
                DELETE_ATTACHMENT_MUTATION,
                serde_json::json!({ "id": id }),
            )
            .await?;
        Ok(data.delete_attachment)
    }
}
