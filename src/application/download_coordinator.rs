use std::collections::VecDeque;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures::{FutureExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::{
    api::{ApiClient, SearchResult},
    config::DownloadConfig,
    domain::{AppError, DownloadError, DownloadTask},
    utils::{file_extension, sanitize_filename},
};

const FALLBACK_FILENAME: &str = "download";

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Started { position: usize, name: String },
    Completed { position: usize, path: PathBuf },
    Failed { position: usize, name: String },
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
    config: DownloadConfig,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient, config: DownloadConfig) -> Self {
        Self { api_client, config }
    }

    /// Name shown to the user while a result downloads.
    pub fn display_name(&self, result: &SearchResult) -> String {
        self.config
            .file_naming
            .apply(result)
            .unwrap_or_else(|| format!("{} - {}", result.artist, result.title))
    }

    /// `<base_dir>/<folder>/<name>.<ext>`; the extension comes from `server_filename`.
    pub fn destination(&self, result: &SearchResult, server_filename: Option<&str>) -> PathBuf {
        let folder = self
            .config
            .folder_naming
            .apply(result)
            .map(|name| sanitize_filename(&name))
            .unwrap_or_default();

        let custom = self
            .config
            .file_naming
            .apply(result)
            .map(|name| sanitize_filename(&name))
            .filter(|name| !name.is_empty());

        let filename = match custom {
            Some(stem) => match server_filename.and_then(file_extension) {
                Some(ext) => format!("{}.{}", stem, sanitize_filename(ext)),
                None => stem,
            },
            None => server_filename
                .map(sanitize_filename)
                .filter(|name| !name.is_empty())
                .or_else(|| Some(sanitize_filename(&result.hash)).filter(|h| !h.is_empty()))
                .unwrap_or_else(|| FALLBACK_FILENAME.to_string()),
        };

        let dir = if folder.is_empty() {
            self.config.base_dir.clone()
        } else {
            self.config.base_dir.join(folder)
        };
        dir.join(filename)
    }

    /// Streams one result to disk, overwriting any file already at the destination.
    pub async fn download(&self, result: &SearchResult) -> Result<PathBuf, DownloadError> {
        let mut download = self.api_client.open_download(&result.hash).await?;
        let path = self.destination(result, download.filename.as_deref());

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| DownloadError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let write_error = |source| DownloadError::Write {
            path: path.clone(),
            source,
        };

        let mut file = tokio::fs::File::create(&path).await.map_err(write_error)?;
        while let Some(chunk) = download.body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_error)?;
        }
        file.sync_all().await.map_err(write_error)?;

        Ok(path)
    }

    /// Downloads every task with at most `workers` in flight.
    ///
    /// Returns only after all tasks have finished. A failing task does not stop
    /// its siblings; the first failure observed is returned once the pool is drained.
    pub async fn dispatch<F>(
        &self,
        tasks: Vec<DownloadTask>,
        on_event: F,
    ) -> Result<Vec<PathBuf>, AppError>
    where
        F: Fn(DownloadEvent) + Send + Sync + 'static,
    {
        let on_event = Arc::new(on_event);
        let coordinator = self.clone();

        let (outcomes, panics) = run_pool(tasks, self.config.workers, move |task: DownloadTask| {
            let coordinator = coordinator.clone();
            let on_event = Arc::clone(&on_event);
            async move {
                let name = coordinator.display_name(&task.result);
                on_event(DownloadEvent::Started {
                    position: task.position,
                    name: name.clone(),
                });

                let outcome = coordinator.download(&task.result).await;
                match &outcome {
                    Ok(path) => {
                        tracing::info!(hash = %task.result.hash, path = %path.display(), "download finished");
                        on_event(DownloadEvent::Completed {
                            position: task.position,
                            path: path.clone(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(hash = %task.result.hash, error = %e, "download failed");
                        on_event(DownloadEvent::Failed {
                            position: task.position,
                            name: name.clone(),
                        });
                    }
                }
                (task.position, name, outcome)
            }
        })
        .await;

        let mut paths = Vec::with_capacity(outcomes.len());
        let mut first_error = None;
        for (position, name, outcome) in outcomes {
            match outcome {
                Ok(path) => paths.push((position, path)),
                Err(source) => {
                    first_error.get_or_insert(AppError::Download { name, source });
                }
            }
        }

        if let Some(panic) = panics.into_iter().next() {
            first_error.get_or_insert(AppError::Download {
                name: "worker".to_string(),
                source: DownloadError::Worker(panic),
            });
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        paths.sort_by_key(|(position, _)| *position);
        Ok(paths.into_iter().map(|(_, path)| path).collect())
    }
}

/// Runs `work` over `items` on `workers` tasks sharing one queue.
///
/// Outputs are returned in completion order, together with the messages of
/// any item that panicked. A panicking item does not stop its worker.
async fn run_pool<T, R, F, Fut>(items: Vec<T>, workers: usize, work: F) -> (Vec<R>, Vec<String>)
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let workers = workers.max(1).min(items.len());
    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let work = Arc::new(work);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut join_set = JoinSet::new();
    for worker in 0..workers {
        let queue = Arc::clone(&queue);
        let work = Arc::clone(&work);
        let tx = tx.clone();
        join_set.spawn(async move {
            loop {
                // The guard must be released before awaiting.
                let next = match queue.lock() {
                    Ok(mut queue) => queue.pop_front(),
                    Err(poisoned) => poisoned.into_inner().pop_front(),
                };
                let Some(item) = next else {
                    break;
                };
                tracing::debug!(worker, "task started");
                let output = AssertUnwindSafe(async { work(item).await })
                    .catch_unwind()
                    .await
                    .map_err(panic_message);
                if let Err(message) = &output {
                    tracing::error!(worker, %message, "task panicked");
                }
                // The receiver outlives every worker.
                let _ = tx.send(output);
            }
        });
    }
    drop(tx);

    let mut panics = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        if let Err(e) = joined {
            panics.push(e.to_string());
        }
    }

    let mut outputs = Vec::new();
    while let Some(output) = rx.recv().await {
        match output {
            Ok(output) => outputs.push(output),
            Err(message) => panics.push(message),
        }
    }

    (outputs, panics)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
