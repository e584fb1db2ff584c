use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use vrn_logic::{is_logic_file, is_view_file};
use vrn_workspace::{
    classify_event, DocumentSession, FileWatcher, MpscChannel, SessionOptions,
};

fn collect_view_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().map(|n| n == "node_modules").unwrap_or(false) {
                continue;
            }
            collect_view_files(&path, out);
        } else if is_view_file(&path) {
            out.push(path);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let mut token = format!("vrn-{}", std::process::id());
    let mut root_dir = std::env::current_dir()?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--token" | "-t" => {
                if i + 1 < args.len() {
                    token = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("--token requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Usage: vrn-server [OPTIONS] [ROOT_DIR]");
                println!();
                println!("Options:");
                println!("  -t, --token <TOKEN>     Connection token clients must present");
                println!("  -h, --help              Show this help message");
                println!();
                println!("Arguments:");
                println!("  [ROOT_DIR]              Project root to serve (default: current dir)");
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                root_dir = PathBuf::from(arg);
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    println!("Starting VRN workspace server...");
    println!("Root directory: {:?}", root_dir);
    println!("Connection token: {}", token);

    let mut view_files = Vec::new();
    collect_view_files(&root_dir, &mut view_files);
    view_files.sort();
    tracing::info!(count = view_files.len(), "discovered view files");

    let mut session = DocumentSession::new(SessionOptions::new(token.clone()));
    session.set_project_files(view_files.clone());

    // Internal client so every session event is visible in the server log
    let (channel, mut events) = MpscChannel::pair();
    let observer = session.connect(&token, Box::new(channel))?;

    tracing::debug!(connection = observer, "observer client attached");
    let session = Arc::new(Mutex::new(session));

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => tracing::debug!(event = %json, "session event"),
                Err(err) => tracing::error!(error = %err, "failed to encode session event"),
            }
        }
    });

    // Watch the project and feed external changes into the session
    let watcher = FileWatcher::new(&root_dir)?;
    let watch_session = Arc::clone(&session);
    tokio::task::spawn_blocking(move || {
        while let Some(event) = watcher.next_event() {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    tracing::error!(error = %err, "watch error");
                    continue;
                }
            };
            let Some((kind, paths)) = classify_event(&event) else {
                continue;
            };
            let paths: Vec<PathBuf> = paths.to_vec();
            let session = Arc::clone(&watch_session);
            tokio::runtime::Handle::current().block_on(async move {
                let mut session = session.lock().await;
                for path in &paths {
                    if is_view_file(path) {
                        session.handle_file_change(path, kind);
                    } else if is_logic_file(path) {
                        session.handle_logic_file_change(path);
                    }
                }
            });
        }
    });

    tokio::signal::ctrl_c().await?;
    println!("Shutting down");
    Ok(())
}
