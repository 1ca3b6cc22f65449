//! Image uploader command line
//!
//! Usage:
//!   image-uploader upload <file> <key>
//!   image-uploader upload-url <url> <key>
//!   image-uploader get <key> <output-file>
//!   image-uploader delete <key>
//!
//! Connection settings come from the settings file and environment variables,
//! see [`image_uploader::settings`].

use anyhow::{bail, Context, Result};
use image_uploader::s3::S3Client;
use image_uploader::settings::Settings;
use image_uploader::ImageUploader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
usage:
  image-uploader upload <file> <key>
  image-uploader upload-url <url> <key>
  image-uploader get <key> <output-file>
  image-uploader delete <key>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!("missing command\n{}", USAGE);
    };

    let settings = Settings::load()?;
    let config = settings.uploader_config()?;

    let uploader = if settings.has_static_credentials() {
        ImageUploader::new(config)
    } else {
        tracing::info!("No static credentials configured, using the default AWS credential chain");
        let mut uploader =
            ImageUploader::with_store(S3Client::from_env(config.s3).await, config.public_url);
        if let Some(timeout) = config.request_timeout {
            uploader = uploader.with_request_timeout(timeout);
        }
        uploader
    };

    match (command.as_str(), rest) {
        ("upload", [path, key]) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path))?;
            let url = uploader.upload(file, key).await?;
            println!("{}", url);
        }
        ("upload-url", [source, key]) => {
            let url = uploader.upload_from_url(source, key).await?;
            println!("{}", url);
        }
        ("get", [key, output]) => {
            let data = uploader.fetch(key).await?;
            tokio::fs::write(output, &data)
                .await
                .with_context(|| format!("Failed to write {}", output))?;
            println!("{} bytes written to {}", data.len(), output);
        }
        ("delete", [key]) => {
            uploader.delete(key).await?;
            println!("deleted {}", key);
        }
        _ => bail!("unknown command or wrong arguments\n{}", USAGE),
    }

    Ok(())
}
