//! Directory description demo
//!
//! Reconciles and lists a directory, then prints the rendered description of
//! every multimedia file in it.
//!
//! Run with:
//! ```bash
//! cargo run -p core-metadata --example describe_dir -- /path/to/kb
//!
//! # JSON logs, only file names in the output
//! cargo run -p core-metadata --example describe_dir -- /path/to/kb json hide
//! ```

use bridge_desktop::TokioFileSystem;
use bridge_traits::time::LogLevel;
use core_metadata::{DescriptionService, RenderOptions};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or("."));

    let format = match args.get(2).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::default(),
    };
    let hide_file_path = args.get(3).is_some_and(|arg| arg == "hide");

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )?;

    let config = CoreConfig::builder()
        .file_system(Arc::new(TokioFileSystem::new()))
        .build()?;
    let service = DescriptionService::new(&config);

    let report = service.reconcile(&dir).await?;
    for (from, to) in &report.reconciled {
        println!("reattached {from} -> {to}");
    }
    for orphan in &report.orphaned {
        println!("orphaned   {orphan}");
    }

    let listing = service.list_directory(&dir).await?;
    info!(
        text = listing.text_files.len(),
        multimedia = listing.multimedia_files.len(),
        "Directory scanned"
    );

    let options = RenderOptions::all().hide_file_path(hide_file_path);
    for file in listing.multimedia_in(&dir) {
        match service.render(&file.path, &options).await {
            Some(text) => println!("{text}\n"),
            None => println!("[{}: no description, {}]\n", file.mime_type, file.path.display()),
        }
    }

    Ok(())
}
