use std::io::{self, BufRead};
use std::path::PathBuf;

use crate::api::ApiClient;
use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::config::Config;
use crate::domain::AppError;
use crate::ui;
use crate::utils::parse_selection;

pub struct DownloadApp {
    api_client: ApiClient,
    coordinator: DownloadCoordinator,
}

impl DownloadApp {
    pub fn new(config: Config) -> Self {
        let api_client = ApiClient::new(config.api);
        let coordinator = DownloadCoordinator::new(api_client.clone(), config.download);

        Self {
            api_client,
            coordinator,
        }
    }

    /// Search, ask which results to fetch, then download them.
    pub async fn run<R>(&self, query: &str, input: R) -> Result<Vec<PathBuf>, AppError>
    where
        R: BufRead + Send + 'static,
    {
        ui::print_searching(query);
        let results = self
            .api_client
            .search(query)
            .await
            .map_err(AppError::Search)?;
        tracing::info!(count = results.len(), "search returned");
        ui::print_results(&results);

        ui::print_prompt().map_err(AppError::Input)?;
        let line = read_line(input).await?;
        let selection = parse_selection(&line)?;
        let tasks = selection.pick(&results);
        tracing::info!(selected = tasks.len(), "dispatching downloads");

        let paths = self
            .coordinator
            .dispatch(tasks, |event| match event {
                DownloadEvent::Started { name, .. } => ui::print_downloading(&name),
                DownloadEvent::Completed { position, path } => {
                    tracing::debug!(position, path = %path.display(), "saved");
                }
                DownloadEvent::Failed { position, name } => {
                    tracing::debug!(position, %name, "not saved");
                }
            })
            .await?;

        ui::print_done();
        Ok(paths)
    }
}

/// Reads one line on a blocking thread so the runtime can still observe Ctrl-C.
async fn read_line<R>(mut input: R) -> Result<String, AppError>
where
    R: BufRead + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut line = String::new();
        input.read_line(&mut line).map(|_| line)
    })
    .await
    .map_err(|e| AppError::Input(io::Error::other(e)))?
    .map_err(AppError::Input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;
    use crate::config::DownloadConfig;
    use std::io::Cursor;

    const TWO_RESULTS: &str = r#"[
        {"artist": "Artist 1", "title": "Title 1", "album": "Album", "hash": "hash1"},
        {"artist": "Artist 2", "title": "Title 2", "album": "Album", "hash": "hash2"}
    ]"#;

    fn app(base_url: String, base_dir: PathBuf) -> DownloadApp {
        DownloadApp::new(Config {
            api: ApiConfig {
                base_url,
                api_key: "key".to_string(),
            },
            download: DownloadConfig {
                workers: 2,
                base_dir,
                ..DownloadConfig::default()
            },
        })
    }

    fn input(text: &str) -> Cursor<Vec<u8>> {
        Cursor::new(text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_selected_result_is_the_only_download() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search/foo")
            .with_status(200)
            .with_body(TWO_RESULTS)
            .create_async()
            .await;
        let first = server
            .mock("GET", "/api/download/hash1")
            .with_status(200)
            .with_header("content-disposition", "attachment; filename*=utf-8''one.opus")
            .with_body("first")
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/download/hash2")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let paths = app(server.url(), dir.path().to_path_buf())
            .run("foo", input("1\n"))
            .await
            .unwrap();

        let expected = dir.path().join("Album").join("Artist 1 - Title 1.opus");
        assert_eq!(paths, vec![expected.clone()]);
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "first");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_results_finish_without_downloads() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search/nothing")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let downloads = server
            .mock("GET", mockito::Matcher::Regex("^/api/download/".into()))
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let paths = app(server.url(), dir.path().to_path_buf())
            .run("nothing", input("1-3,7\n"))
            .await
            .unwrap();

        assert!(paths.is_empty());
        downloads.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search/foo")
            .with_status(503)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let err = app(server.url(), dir.path().to_path_buf())
            .run("foo", input("1\n"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Search(_)));
        assert_eq!(err.to_string(), "Received 503 from server.");
    }

    #[tokio::test]
    async fn test_unparseable_selection_downloads_nothing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search/foo")
            .with_status(200)
            .with_body(TWO_RESULTS)
            .create_async()
            .await;
        let downloads = server
            .mock("GET", mockito::Matcher::Regex("^/api/download/".into()))
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let err = app(server.url(), dir.path().to_path_buf())
            .run("foo", input("1-99999999999999999999999\n"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidSelection(_)));
        downloads.assert_async().await;
    }

    #[tokio::test]
    async fn test_closed_input_is_an_empty_selection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/search/foo")
            .with_status(200)
            .with_body(TWO_RESULTS)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let paths = app(server.url(), dir.path().to_path_buf())
            .run("foo", input(""))
            .await
            .unwrap();
        assert!(paths.is_empty());
    }
}
