//! Integration tests for the mirror pipeline
//!
//! These tests use wiremock to stand in for a HedgeDoc server and run the
//! full crawl, materialize, convert and rename cycle end-to-end.

use medusa::config::Config;
use medusa::crawler::mirror;
use medusa::storage::{checksum, Vault};
use medusa::{DocumentId, MedusaError};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration mirroring `root` into `vault_dir`
fn create_test_config(root: &str, vault_dir: &Path, rename: bool) -> Config {
    let mut config = Config::for_root(root);
    config.hedgedoc.start = "navigation".to_string();
    config.vault.path = vault_dir.display().to_string();
    config.vault.rename = rename;
    config.fetch.timeout_secs = 2;
    config
}

/// Serves `body` as the download of pad `id`
async fn mount_pad(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/download", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Checksums of every document in the vault, keyed by relative path
fn vault_checksums(dir: &Path) -> BTreeMap<String, String> {
    let vault = Vault::create(dir).expect("Failed to open vault");
    vault
        .list_documents()
        .expect("Failed to list vault")
        .into_iter()
        .map(|relative| {
            let content = vault.read(&relative).expect("Failed to read document");
            (relative.display().to_string(), checksum(&content))
        })
        .collect()
}

#[tokio::test]
async fn test_full_mirror() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_pad(
        &mock_server,
        "navigation",
        format!(
            "# Navigation\n\n- [Meeting notes]({}/meetings?view)\n- [Docs](https://docs.example.org/x)\n",
            base_url
        ),
    )
    .await;
    mount_pad(
        &mock_server,
        "meetings",
        format!(
            "---\ntitle: Meetings\n---\nBack to [the *index*]({}/navigation#top)\n",
            base_url
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path(), true);

    let summary = mirror(&config).await.expect("Mirror failed");

    assert_eq!(
        summary.crawl.documents.iter().map(DocumentId::as_str).collect::<Vec<_>>(),
        vec!["meetings", "navigation"]
    );
    assert_eq!(summary.materialized.len(), 2);
    assert_eq!(summary.conversion.links, 2);
    assert_eq!(summary.renames.as_ref().unwrap().renamed.len(), 2);

    let navigation = std::fs::read_to_string(dir.path().join("Navigation.md")).unwrap();
    assert_eq!(
        navigation,
        "# Navigation\n\n- [[Meetings|Meeting notes]]\n- [Docs](https://docs.example.org/x)\n"
    );

    let meetings = std::fs::read_to_string(dir.path().join("Meetings.md")).unwrap();
    assert_eq!(
        meetings,
        "---\ntitle: Meetings\n---\nBack to [[Navigation|the *index*]]\n"
    );

    assert!(!dir.path().join("navigation.md").exists());
    assert!(!dir.path().join("meetings.md").exists());
}

#[tokio::test]
async fn test_cycle_downloads_each_pad_for_discovery_and_materialization() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for (id, next) in [("navigation", "b"), ("b", "c"), ("c", "navigation")] {
        Mock::given(method("GET"))
            .and(path(format!("/{}/download", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("[next]({}/{})\n", base_url, next)),
            )
            // one discovery download plus one forced refresh
            .expect(2)
            .mount(&mock_server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path(), false);

    let summary = mirror(&config).await.expect("Mirror failed");

    assert_eq!(summary.crawl.documents.len(), 3);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("c.md")).unwrap(),
        "[[navigation|next]]\n"
    );
}

#[tokio::test]
async fn test_unavailable_pad_is_still_written() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_pad(
        &mock_server,
        "navigation",
        format!("[Broken]({}/broken)\n", base_url),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken/download"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path(), false);

    let summary = mirror(&config).await.expect("Mirror failed");

    assert_eq!(summary.crawl.documents.len(), 2);
    assert!(summary.crawl.empty.contains(&DocumentId::new("broken")));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("broken.md")).unwrap(),
        ""
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("navigation.md")).unwrap(),
        "[[broken|Broken]]\n"
    );
}

#[tokio::test]
async fn test_foreign_server_is_never_contacted() {
    let mock_server = MockServer::start().await;
    let foreign_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Foreign"))
        .expect(0)
        .mount(&foreign_server)
        .await;

    mount_pad(
        &mock_server,
        "navigation",
        format!("[Elsewhere]({}/pad)\n", foreign_server.uri()),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path(), false);

    let summary = mirror(&config).await.expect("Mirror failed");

    assert_eq!(summary.crawl.documents.len(), 1);
    assert_eq!(summary.conversion.links, 0);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("navigation.md")).unwrap(),
        format!("[Elsewhere]({}/pad)\n", foreign_server.uri())
    );
}

#[tokio::test]
async fn test_rerun_produces_identical_vault() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_pad(
        &mock_server,
        "navigation",
        format!("# Home\n[Alpha]({0}/a) [Beta]({0}/b?edit)\nsee b.md\n", base_url),
    )
    .await;
    mount_pad(&mock_server, "a", format!("# Alpha\n[home]({}/navigation)\n", base_url)).await;
    mount_pad(&mock_server, "b", "no title here\n".to_string()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path(), true);

    mirror(&config).await.expect("First mirror failed");
    let first = vault_checksums(dir.path());

    mirror(&config).await.expect("Second mirror failed");
    let second = vault_checksums(dir.path());

    assert_eq!(
        first.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["Alpha.md", "Home.md", "b.md"]
    );
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unusable_vault_fails_before_any_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let file = tempfile::NamedTempFile::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &file.path().join("vault"), true);

    let result = mirror(&config).await;
    assert!(matches!(result, Err(MedusaError::Storage(_))));
}
