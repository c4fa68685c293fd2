use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use structurify_client::{JobStatus, StructurifyError, WaitOptions};
use structurify_core::models::{
    CreateExportParams, CreateProjectParams, DocumentStatus, ExportDownload, ExportFormat,
};
use wiremock::matchers::{
    body_json, body_string_contains, header_regex, method, path, query_param,
};
use wiremock::{Mock, ResponseTemplate};

use crate::integration::common::{api, job_json, setup};

fn project_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "templateId": "tpl_invoice",
        "documentCount": 2,
        "createdAt": "2026-01-15T10:00:00Z",
        "updatedAt": "2026-01-15T11:00:00Z"
    })
}

fn document_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "mimeType": "application/pdf",
        "size": 5,
        "status": "pending",
        "createdAt": "2026-01-15T10:00:00Z"
    })
}

fn export_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "projectId": "proj_1",
        "format": "csv",
        "status": "ready",
        "createdAt": "2026-01-15T10:00:00Z"
    })
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn templates_list_and_get() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/project-templates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "templates": [
                {"id": "tpl_invoice", "name": "Invoice", "category": "finance"},
                {"id": "tpl_receipt", "name": "Receipt"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/project-templates/tpl_invoice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "template": {
                "id": "tpl_invoice",
                "name": "Invoice",
                "columns": [
                    {"id": "col_total", "label": "Total", "prompt": "Invoice total", "format": "number"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let templates = client.templates().list().await.unwrap();
    assert_eq!(templates.len(), 2);
    assert_eq!(templates[0].category.as_deref(), Some("finance"));

    let template = client.templates().get("tpl_invoice").await.unwrap();
    let columns = template.columns.unwrap();
    assert_eq!(columns[0].label, "Total");
}

#[tokio::test]
async fn column_templates_default_to_empty() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/templates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let columns = client.templates().list_columns().await.unwrap();
    assert!(columns.is_empty());
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn projects_crud() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/projects")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "projects": [project_json("proj_1", "Invoices")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(api("/projects")))
        .and(body_json(json!({
            "name": "Invoices",
            "templateId": "tpl_invoice",
            "description": "Q1 invoices"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "project": project_json("proj_1", "Invoices")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(api("/projects/proj_1")))
        .and(body_json(json!({"name": "Renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "project": project_json("proj_1", "Renamed")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/projects/proj_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "project": project_json("proj_1", "Invoices"),
            "columns": [
                {"id": "col_1", "label": "Total", "prompt": "Total", "format": "number", "position": 0}
            ],
            "documents": [document_json("doc_1", "a.pdf")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(api("/projects/proj_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Project deleted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let projects = client.projects().list().await.unwrap();
    assert_eq!(projects[0].document_count, Some(2));

    let params =
        CreateProjectParams::new("Invoices", "tpl_invoice").with_description("Q1 invoices");
    let created = client.projects().create(&params).await.unwrap();
    assert_eq!(created.id, "proj_1");

    let renamed = client.projects().update("proj_1", "Renamed").await.unwrap();
    assert_eq!(renamed.name, "Renamed");

    let details = client.projects().get("proj_1").await.unwrap();
    assert_eq!(details.columns.len(), 1);
    assert_eq!(details.documents[0].status, DocumentStatus::Pending);

    let deleted = client.projects().delete("proj_1").await.unwrap();
    assert!(deleted.success);
    assert_eq!(deleted.message, "Project deleted");
}

#[tokio::test]
async fn ids_are_sent_as_single_encoded_segments() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/projects/a%2Fb%3Fc%23d")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "project": project_json("a/b?c#d", "Odd"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let details = client.projects().get("a/b?c#d").await.unwrap();
    assert_eq!(details.project.id, "a/b?c#d");
}

#[tokio::test]
async fn missing_project_is_not_found() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/projects/nope")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "NOT_FOUND",
            "message": "Project not found"
        })))
        .mount(&server)
        .await;

    let err = client.projects().get("nope").await.unwrap_err();
    assert!(matches!(err, StructurifyError::NotFound { ref message } if message == "Project not found"));
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn document_upload_sends_base64_and_guessed_mime() {
    let (server, client) = setup(0).await;

    Mock::given(method("POST"))
        .and(path(api("/documents")))
        .and(body_json(json!({
            "projectId": "proj_1",
            "fileName": "invoice.pdf",
            "content": "aGVsbG8=",
            "mimeType": "application/pdf"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "document": document_json("doc_1", "invoice.pdf")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client
        .documents()
        .upload("proj_1", "invoice.pdf", b"hello", None)
        .await
        .unwrap();
    assert_eq!(doc.id, "doc_1");
}

#[tokio::test]
async fn document_upload_from_path_uses_file_name() {
    let (server, client) = setup(0).await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("scan.PNG");
    std::fs::File::create(&file_path)
        .unwrap()
        .write_all(b"hello")
        .unwrap();

    Mock::given(method("POST"))
        .and(path(api("/documents")))
        .and(body_json(json!({
            "projectId": "proj_1",
            "fileName": "scan.PNG",
            "content": "aGVsbG8=",
            "mimeType": "image/png"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "document": document_json("doc_2", "scan.PNG")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client
        .documents()
        .upload_from_path("proj_1", &file_path, None)
        .await
        .unwrap();
    assert_eq!(doc.id, "doc_2");
}

#[tokio::test]
async fn document_upload_multipart_sends_form_fields() {
    let (server, client) = setup(0).await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("scan.png");
    std::fs::File::create(&file_path)
        .unwrap()
        .write_all(b"PNGDATA")
        .unwrap();

    Mock::given(method("POST"))
        .and(path(api("/documents")))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"projectId\""))
        .and(body_string_contains("proj_1"))
        .and(body_string_contains("name=\"name\""))
        .and(body_string_contains("receipt-march.png"))
        .and(body_string_contains(
            "name=\"file\"; filename=\"receipt-march.png\"",
        ))
        .and(body_string_contains("PNGDATA"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "document": document_json("doc_3", "receipt-march.png")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client
        .documents()
        .upload_multipart("proj_1", &file_path, Some("receipt-march.png"))
        .await
        .unwrap();
    assert_eq!(doc.id, "doc_3");
}

#[tokio::test]
async fn document_upload_multipart_defaults_to_file_name() {
    let (server, client) = setup(0).await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("scan.png");
    std::fs::File::create(&file_path)
        .unwrap()
        .write_all(b"PNGDATA")
        .unwrap();

    Mock::given(method("POST"))
        .and(path(api("/documents")))
        .and(body_string_contains("filename=\"scan.png\""))
        .and(body_string_contains("image/png"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "document": document_json("doc_4", "scan.png")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client
        .documents()
        .upload_multipart("proj_1", &file_path, None)
        .await
        .unwrap();
    assert_eq!(doc.id, "doc_4");
}

#[tokio::test]
async fn document_upload_from_missing_path_is_io_error() {
    let (_server, client) = setup(0).await;

    let err = client
        .documents()
        .upload_from_path("proj_1", "/definitely/not/here.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StructurifyError::Io(_)));
}

#[tokio::test]
async fn document_get_download_delete() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/documents/doc_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "document": document_json("doc_1", "invoice.pdf")
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/documents/doc_1/content")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "content": "aGVsbG8=",
            "mimeType": "application/pdf"
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(api("/documents/doc_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Document deleted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client.documents().get("doc_1").await.unwrap();
    assert_eq!(doc.mime_type, "application/pdf");

    let content = client.documents().get_content("doc_1").await.unwrap();
    assert_eq!(content.mime_type, "application/pdf");

    let bytes = client.documents().download("doc_1").await.unwrap();
    assert_eq!(bytes, b"hello");

    let deleted = client.documents().delete("doc_1").await.unwrap();
    assert!(deleted.success);
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extraction_run_get_list_cancel() {
    let (server, client) = setup(0).await;

    Mock::given(method("POST"))
        .and(path(api("/extraction-jobs")))
        .and(body_json(json!({"projectId": "proj_1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "job": job_json("job_1", "pending", 0)
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/extraction-jobs/job_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "job": job_json("job_1", "processing", 50)
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/extraction-jobs")))
        .and(query_param("projectId", "proj_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "jobs": [job_json("job_1", "processing", 50), job_json("job_0", "done", 100)]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(api("/extraction-jobs/job_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Job cancelled"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = client.extraction().run("proj_1").await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let job = client.extraction().get("job_1").await.unwrap();
    assert_eq!(job.progress, 50.0);

    let jobs = client.extraction().list("proj_1").await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs[1].is_terminal());

    let cancelled = client.extraction().cancel("job_1").await.unwrap();
    assert_eq!(cancelled.message, "Job cancelled");
}

#[tokio::test]
async fn wait_for_completion_returns_third_poll() {
    let (server, client) = setup(0).await;
    let polls = Arc::new(AtomicUsize::new(0));
    let polls_clone = polls.clone();

    Mock::given(method("GET"))
        .and(path(api("/extraction-jobs/job_1")))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            let current = polls_clone.fetch_add(1, Ordering::SeqCst);
            let job = if current < 2 {
                job_json("job_1", "processing", 50)
            } else {
                job_json("job_1", "done", 100)
            };
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "job": job}))
        })
        .mount(&server)
        .await;

    let options = WaitOptions::new(Duration::from_secs(5), Duration::from_millis(10));
    let job = client
        .extraction()
        .wait_for_completion("job_1", options)
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.completed_tasks, 4);
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn wait_for_completion_times_out() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/extraction-jobs/job_stuck")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "job": job_json("job_stuck", "processing", 25)
        })))
        .mount(&server)
        .await;

    let options = WaitOptions::new(Duration::from_millis(50), Duration::from_millis(10));
    let err = client
        .extraction()
        .wait_for_completion("job_stuck", options)
        .await
        .unwrap_err();

    match &err {
        StructurifyError::JobTimeout {
            job_id,
            status,
            progress,
            ..
        } => {
            assert_eq!(job_id, "job_stuck");
            assert_eq!(*status, JobStatus::Processing);
            assert_eq!(*progress, 25.0);
        }
        other => panic!("expected JobTimeout, got {other:?}"),
    }
    assert!(err.to_string().contains("job_stuck"));
}

#[tokio::test]
async fn wait_for_completion_propagates_fetch_errors() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/extraction-jobs/job_1")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "AUTH_ERROR",
            "message": "Invalid API key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .extraction()
        .wait_for_completion("job_1", WaitOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StructurifyError::Authentication { .. }));
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exports_create_get_list_delete() {
    let (server, client) = setup(0).await;

    Mock::given(method("POST"))
        .and(path(api("/exports")))
        .and(body_json(json!({
            "projectId": "proj_1",
            "format": "csv",
            "documentIds": ["doc_1"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "export": export_json("exp_1"),
            "data": "total\n42\n"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/exports/exp_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "export": export_json("exp_1")
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/exports")))
        .and(query_param("projectId", "proj_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(api("/exports/exp_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Export deleted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = CreateExportParams::new("proj_1", ExportFormat::Csv)
        .with_document_ids(vec!["doc_1".to_string()]);
    let created = client.exports().create(&params).await.unwrap();
    assert_eq!(created.data.as_deref(), Some("total\n42\n"));

    let export = client.exports().get("exp_1").await.unwrap();
    assert_eq!(export.format, ExportFormat::Csv);

    let exports = client.exports().list("proj_1").await.unwrap();
    assert!(exports.is_empty());

    let deleted = client.exports().delete("exp_1").await.unwrap();
    assert!(deleted.success);
}

#[tokio::test]
async fn export_download_inline_or_object() {
    let (server, client) = setup(0).await;

    Mock::given(method("GET"))
        .and(path(api("/exports/exp_inline/download")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": "[{\"total\": 42}]"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/exports/exp_remote/download")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"downloadUrl": "https://files.example/exp.csv"})),
        )
        .mount(&server)
        .await;

    let inline = client.exports().download("exp_inline").await.unwrap();
    assert_eq!(inline.as_inline(), Some("[{\"total\": 42}]"));

    let object = client.exports().download("exp_remote").await.unwrap();
    assert_eq!(
        object,
        ExportDownload::Object(json!({"downloadUrl": "https://files.example/exp.csv"}))
    );
}

#[tokio::test]
async fn create_and_fetch_downloads_when_not_inline() {
    let (server, client) = setup(0).await;

    Mock::given(method("POST"))
        .and(path(api("/exports")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "export": export_json("exp_2")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api("/exports/exp_2/download")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "a,b\n"})))
        .expect(1)
        .mount(&server)
        .await;

    let params = CreateExportParams::new("proj_1", ExportFormat::Csv);
    let data = client.exports().create_and_fetch(&params).await.unwrap();
    assert_eq!(data, ExportDownload::Inline("a,b\n".to_string()));
}
