use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncWriteExt;

use crate::extract::prettify;
use crate::models::{ExtractedImage, PageStructure};
use crate::tag::{platform_tagger, SourceTagger};

// ── Constants ────────────────────────────────────────────────────────────────

const MAX_STEM_CHARS: usize = 200;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not move {} to the trash: {1}", .0.display())]
    Trash(PathBuf, String),
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ── Strategies ───────────────────────────────────────────────────────────────

/// Where the built structure ends up.
pub enum OutputTarget {
    /// Pretty-printed markup in a single file.
    File(PathBuf),
    /// One file per extracted image inside a fresh directory.
    Directory { path: PathBuf, client: reqwest::Client },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub saved: usize,
    pub total: usize,
}

impl OutputTarget {
    pub async fn write(&self, structure: &PageStructure) -> Result<WriteSummary, OutputError> {
        match self {
            OutputTarget::File(path) => {
                write_page(path, structure).await?;
                Ok(WriteSummary { saved: 1, total: 1 })
            }
            OutputTarget::Directory { path, client } => {
                tracing::info!(dir = %path.display(), "creating files");
                replace_directory(path, move_to_trash).await?;
                let tagger = platform_tagger();
                Ok(save_images(path, structure.images(), client, tagger.as_ref()).await)
            }
        }
    }
}

// ── File output ──────────────────────────────────────────────────────────────

async fn write_page(path: &Path, structure: &PageStructure) -> Result<(), OutputError> {
    tracing::info!(file = %path.display(), "writing page");
    tokio::fs::write(path, prettify(&structure.page))
        .await
        .map_err(|e| OutputError::io(path, e))
}

// ── Directory output ─────────────────────────────────────────────────────────

fn move_to_trash(path: &Path) -> Result<(), OutputError> {
    tracing::info!(dir = %path.display(), "sending existing directory to the trash");
    trash::delete(path).map_err(|e| OutputError::Trash(path.to_path_buf(), e.to_string()))
}

/// Discard an existing directory at `path` and create an empty one there.
/// Anything else already at `path` is left alone and surfaces as an I/O error.
async fn replace_directory<F>(path: &Path, discard: F) -> Result<(), OutputError>
where
    F: FnOnce(&Path) -> Result<(), OutputError>,
{
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => discard(path)?,
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(OutputError::io(path, e)),
    }
    tokio::fs::create_dir(path)
        .await
        .map_err(|e| OutputError::io(path, e))
}

/// `.svg` for SVG sources, `.jpeg` for everything else.
pub fn image_file_name(name: &str, url: &str) -> String {
    let stem: String = UNSAFE_FILE_CHARS
        .replace_all(name, "_")
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let stem = match stem.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => stem,
    };
    let ext = if url.ends_with(".svg") { "svg" } else { "jpeg" };
    format!("{}.{}", stem, ext)
}

/// Download every image in order. A failure is logged and the loop moves on.
async fn save_images(
    dir: &Path,
    images: &[ExtractedImage],
    client: &reqwest::Client,
    tagger: &dyn SourceTagger,
) -> WriteSummary {
    let mut saved = 0;
    for image in images {
        let file_name = image_file_name(&image.name, &image.url);
        let path = dir.join(&file_name);
        match save_image(&path, &image.url, client).await {
            Ok(true) => {
                saved += 1;
                if let Err(e) = tagger.tag_source(&path, &image.url) {
                    tracing::debug!(file = %file_name, "could not tag source url: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    "could not access or save '{}' at {}: {}",
                    file_name,
                    image.url,
                    e
                );
            }
        }
    }

    tracing::info!(saved, total = images.len(), "finished downloading images");
    WriteSummary {
        saved,
        total: images.len(),
    }
}

/// `Ok(false)` when the server answered with anything but 200.
async fn save_image(
    path: &Path,
    url: &str,
    client: &reqwest::Client,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let response = client.get(url).send().await?;
    if response.status() != reqwest::StatusCode::OK {
        tracing::warn!(url, status = response.status().as_u16(), "image not saved");
        return Ok(false);
    }

    let mut file = tokio::fs::File::create(path).await?;
    let mut body = response.bytes_stream();
    let mut written = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;
    tracing::debug!(file = %path.display(), bytes = written, "saved image");
    Ok(true)
}
