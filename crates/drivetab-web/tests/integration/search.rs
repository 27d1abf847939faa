//! Search, result tabs, plots and downloads.

use axum::http::{StatusCode, header};
use drivetab_core::DrivetabConfig;
use drivetab_core::config::ExportSettings;
use drivetab_frame::{Cell, read_csv, read_xlsx};
use drivetab_web::Connection;

use crate::common::{FakeDrive, TestClient, connected, drive, report};

const SEARCH: &str = "folder_id=reports&keyword=tx_curr&extension=.xlsx";

async fn searched() -> TestClient {
    let mut client = TestClient::with_connection(DrivetabConfig::default(), connected(drive()));
    let response = client.post_form("/search", SEARCH).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/?tab=dataset");
    client
}

#[tokio::test]
async fn test_search_shows_combined_dataset() {
    let mut client = searched().await;
    let html = client.get("/?tab=dataset").await.text();
    assert!(html.contains("Results for folder: <code>Reports</code>"));
    assert!(html.contains("✅ 2 files found!"));
    assert!(html.contains("📚 Files found: 2"));
    assert!(html.contains("TX_CURR Q1.xlsx"));
    assert!(html.contains("tx_curr q2.xlsx"));
    assert!(!html.contains("notes.txt"));
    assert!(html.contains("<strong>Rows:</strong> 3 | <strong>Columns:</strong> 2"));
    assert!(html.contains("<td>Mombasa</td>"));
}

#[tokio::test]
async fn test_search_remembers_form_values() {
    let mut client = searched().await;
    let html = client.get("/").await.text();
    assert!(html.contains(r#"<option value="reports" selected>"#));
}

#[tokio::test]
async fn test_search_without_matches() {
    let mut client = TestClient::with_connection(DrivetabConfig::default(), connected(drive()));
    client
        .post_form("/search", "folder_id=empty&keyword=tx_curr&extension=.xlsx")
        .await;
    let html = client.get("/?tab=dataset").await.text();
    assert!(html.contains("❌ No file found."));
    assert!(html.contains("No file found with this keyword."));
}

#[tokio::test]
async fn test_invalid_extension_flashes_error() {
    let mut client = TestClient::with_connection(DrivetabConfig::default(), connected(drive()));
    client
        .post_form("/search", "folder_id=reports&keyword=tx&extension=xlsx")
        .await;
    let html = client.get("/").await.text();
    assert!(html.contains("Search failed"));
    // Flash messages are shown once.
    assert!(!client.get("/").await.text().contains("Search failed"));
}

#[tokio::test]
async fn test_search_requires_connection() {
    let mut client = TestClient::with_connection(
        DrivetabConfig::default(),
        Connection::Unavailable("no secrets".into()),
    );
    let response = client.post_form("/search", SEARCH).await;
    assert_eq!(response.location(), "/");
    assert!(client.get("/").await.text().contains("Not connected to Google Drive"));
}

#[tokio::test]
async fn test_unreadable_file_is_a_warning() {
    let drive = FakeDrive::default()
        .folder("root", "reports", "Reports")
        .file("reports", "good", "tx_curr a.xlsx", report(&[("Nairobi", 1.0)]))
        .file("reports", "bad", "tx_curr b.xlsx", b"not a workbook".to_vec());
    let mut client = TestClient::with_connection(DrivetabConfig::default(), connected(drive));
    client.post_form("/search", SEARCH).await;
    let html = client.get("/").await.text();
    assert!(html.contains("✅ 2 files found!"));
    assert!(html.contains("⚠️ tx_curr b.xlsx: load failed"));
    assert!(html.contains("<strong>Rows:</strong> 1 | <strong>Columns:</strong> 2"));
}

#[tokio::test]
async fn test_analysis_tab_and_plot() {
    let mut client = searched().await;
    let html = client.get("/?tab=analysis").await.text();
    assert!(html.contains("Descriptive statistics"));
    assert!(html.contains("<th>tx_curr</th>"));
    assert!(html.contains("<td>mean</td><td>NaN</td><td>86.666667</td>"));
    assert!(html.contains(r#"src="/plots/1.svg""#));

    let plot = client.get("/plots/1.svg").await;
    assert_eq!(plot.status, StatusCode::OK);
    assert_eq!(plot.header(header::CONTENT_TYPE), "image/svg+xml");
    let svg = plot.text();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Distribution of tx_curr"));
}

#[tokio::test]
async fn test_plot_of_text_column_is_not_found() {
    let mut client = searched().await;
    assert_eq!(client.get("/plots/0.svg").await.status, StatusCode::NOT_FOUND);
    assert_eq!(client.get("/plots/9.svg").await.status, StatusCode::NOT_FOUND);
    assert_eq!(client.get("/plots/x").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_csv() {
    let mut client = searched().await;
    let response = client.get("/export/csv").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "text/csv");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"dataset_combine.csv\""
    );
    let frame = read_csv(&response.body).unwrap();
    assert_eq!(frame.shape(), (3, 2));
    assert_eq!(frame.columns(), ["site", "tx_curr"]);
}

#[tokio::test]
async fn test_export_xlsx_uses_configured_name() {
    let config = DrivetabConfig {
        export: ExportSettings {
            xlsx_file_name: "combined.xlsx".into(),
            ..ExportSettings::default()
        },
        ..DrivetabConfig::default()
    };
    let mut client = TestClient::with_connection(config, connected(drive()));
    client.post_form("/search", SEARCH).await;

    let response = client.get("/export/xlsx").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header(header::CONTENT_DISPOSITION).contains("combined.xlsx"));
    let frame = read_xlsx(&response.body).unwrap();
    assert_eq!(frame.shape(), (3, 2));
    assert_eq!(frame.rows()[0][1], Cell::Number(120.0));
}

#[tokio::test]
async fn test_export_errors() {
    let mut client = TestClient::with_connection(DrivetabConfig::default(), connected(drive()));
    assert_eq!(client.get("/export/csv").await.status, StatusCode::NOT_FOUND);

    client.post_form("/search", SEARCH).await;
    assert_eq!(client.get("/export/pdf").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_results_are_per_browser() {
    let mut first = searched().await;
    let mut second = first.second_browser();

    assert!(first.get("/").await.text().contains("files found!"));
    assert!(!second.get("/").await.text().contains("files found!"));
    assert_eq!(second.get("/export/csv").await.status, StatusCode::NOT_FOUND);
}
