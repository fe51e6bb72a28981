use app_state::ImageEntry;
use color_eyre::eyre::{Result, WrapErr};
use std::path::Path;
use vision_analysis::{BlobLocation, ImageSource};

#[must_use]
pub fn sources_from_settings(entries: &[ImageEntry]) -> Vec<ImageSource> {
    entries
        .iter()
        .map(|entry| match entry {
            ImageEntry::Url(url) => ImageSource::Url(url.clone()),
            ImageEntry::Blob { container, blob } => {
                ImageSource::Blob(BlobLocation::new(container, blob))
            }
        })
        .collect()
}

/// One url per line. Blank lines and lines starting with `#` are ignored.
#[must_use]
pub fn parse_image_list(contents: &str) -> Vec<ImageSource> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| ImageSource::Url(line.to_string()))
        .collect()
}

pub async fn read_image_list(path: &Path) -> Result<Vec<ImageSource>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Cannot read image list {}", path.display()))?;
    Ok(parse_image_list(&contents))
}

/// Images given on the command line replace the configured list.
pub async fn resolve_sources(
    configured: &[ImageEntry],
    cli_images: &[String],
    images_file: Option<&Path>,
) -> Result<Vec<ImageSource>> {
    if cli_images.is_empty() && images_file.is_none() {
        return Ok(sources_from_settings(configured));
    }

    let mut sources: Vec<ImageSource> = cli_images
        .iter()
        .map(|url| ImageSource::Url(url.clone()))
        .collect();
    if let Some(path) = images_file {
        sources.extend(read_image_list(path).await?);
    }
    Ok(sources)
}
