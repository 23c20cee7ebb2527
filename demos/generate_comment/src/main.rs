use commentgen::action::{handle_generate_action, ActionRequest};
use commentgen::config::{ConfigStore, FileConfigStore};
use commentgen::content::{Content, ContentId, InMemoryContentLookup};
use commentgen::orchestrator::CommentOrchestrator;
use commentgen::permission::{Page, SessionTokenGate, Viewer};
use commentgen::transport::HttpTransport;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => fmt().json().with_env_filter(filter).init(),
        _ => fmt().with_env_filter(filter).init(),
    }
}

// usage: generate_comment <title> <url> [config.toml]
#[tokio::main]
async fn main() -> commentgen::Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let title = args
        .next()
        .unwrap_or_else(|| "How to brew better coffee at home".to_string());
    let permalink = args
        .next()
        .unwrap_or_else(|| "https://blog.example/coffee".to_string());
    let config_path = args.next().unwrap_or_else(|| "commentgen.toml".to_string());

    let config_store = FileConfigStore::new(config_path);
    if let Some(missing) = config_store.load()?.missing_setting() {
        tracing::warn!(
            path = %config_store.path().display(),
            missing,
            "comment generation needs to be configured"
        );
    }

    let content_id = ContentId(1);
    let lookup = InMemoryContentLookup::new().with(Content {
        id: content_id,
        title,
        permalink,
    });

    let viewer = Viewer::logged_in("demo-session");
    let gate = SessionTokenGate::new();
    let orchestrator =
        CommentOrchestrator::new(config_store, lookup, gate.clone(), HttpTransport::new());
    let token = gate.issue(&viewer).unwrap_or_default();
    if !orchestrator.should_offer(&viewer, &Page::post(content_id)) {
        tracing::info!("generate button would not be shown");
    }

    let cancel_token = CancellationToken::new();
    tokio::spawn({
        let cancel_token = cancel_token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel_token.cancel();
            }
        }
    });

    let response = handle_generate_action(
        &orchestrator,
        &viewer,
        ActionRequest {
            post_id: content_id.to_string(),
            security: token,
        },
        Some(cancel_token),
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
