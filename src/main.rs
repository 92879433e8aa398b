use bucket_uploader::config::AppConfig;
use bucket_uploader::create_view;
use bucket_uploader::infrastructure::storage;
use bucket_uploader::models::RemoteObjectEntry;
use bucket_uploader::services::picker;
use bucket_uploader::services::upload_view::{PickOutcome, UploadView, ViewState};
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pick local images or PDFs and upload them to the storage bucket.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Upload these files in order, then exit. Without files, picks are read from
    /// stdin: one path per line, a blank line cancels the pick.
    files: Vec<PathBuf>,

    /// Print the bucket listing and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucket_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!("🚀 Starting bucket uploader...");

    let config = AppConfig::from_env()?;
    info!(
        "🛡️  Upload policy: Max Size={}MB, Types={}",
        config.policy.max_size_bytes / 1024 / 1024,
        config.policy.allowed_mime_types.join(", ")
    );

    let store = storage::setup_storage(&config.store).await?;
    let view = create_view(&config, store);

    if cli.list {
        return match view.listing().refresh().await {
            Ok(files) => {
                print_files(&view, &files);
                Ok(())
            }
            Err(e) => {
                println!("Error: {}", e.user_message(&config.policy));
                Err(e.into())
            }
        };
    }

    view.mount().await;
    render(&view);

    if !cli.files.is_empty() {
        for path in &cli.files {
            let picked = picker::describe(path).await;
            report(view.submit(Some(picked)).await);
            render(&view);
        }
        return Ok(());
    }

    println!("Enter a file path to upload (blank line = cancel, Ctrl+D to quit):");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = view.pick(|| picker::pick_from_line(&line)).await;
        report(outcome);
        render(&view);
    }

    info!("👋 Bye");
    Ok(())
}

fn report(outcome: PickOutcome) {
    match outcome {
        PickOutcome::Ignored => println!("An upload is already in progress."),
        PickOutcome::Completed(Ok(result)) => println!("{}", result.notice()),
        PickOutcome::Completed(Err(_)) => {}
    }
}

fn render(view: &UploadView) {
    let snapshot = view.snapshot();

    match &snapshot.state {
        ViewState::Error(message) => println!("Error: {}", message),
        ViewState::Uploading => println!("Uploading..."),
        ViewState::Idle | ViewState::Success(_) => {}
    }

    print_files(view, &snapshot.files);
}

fn print_files(view: &UploadView, files: &[RemoteObjectEntry]) {
    if files.is_empty() {
        println!("No Files Found. Upload some images or PDFs to see them here.");
        return;
    }

    for entry in files {
        let kind = if entry.is_image() { "IMG" } else { "PDF" };
        println!("[{}] {}  {}", kind, entry.name, view.listing().public_url(entry));
    }
}
