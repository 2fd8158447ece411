use analyzer_common::{parse_confidence, parse_max_detections};
use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Commands, HistoryAction};
use client::ApiClient;
use config::{Config, MAX_HISTORY_LIMIT};
use confirm::{AssumeYes, Confirmation, TerminalConfirmation};
use image_analyzer::{cli, client, config, confirm, render, session, shell, upload};
use session::Session;
use tracing_subscriber::EnvFilter;
use upload::SelectedFile;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load()?;
    if let Some(url) = cli.base_url.clone() {
        config.set_base_url(url)?;
    }

    match cli.command {
        Commands::Analyze { file, conf, max_dets, detector } => {
            println!("📸 image-analyzer - analyze\n");

            let mut params = config.default_parameters();
            if let Some(conf) = conf {
                params.set_confidence(parse_confidence(&conf)?);
            }
            if let Some(max_dets) = max_dets {
                params.set_max_detections(parse_max_detections(&max_dets)? as i64);
            }
            if let Some(detector) = detector {
                params.set_detector(detector);
            }

            let selected = SelectedFile::from_path(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let client = ApiClient::from_config(&config)?;
            let mut session = Session::new(client, AssumeYes, params)
                .with_history_limit(config.history_limit);
            session.select_file(Some(selected));

            // 単発実行では履歴を表示しないので再読込は省く
            let pb = shell::spinner("Analyzing...");
            session.analyze_selected().await;
            pb.finish_and_clear();

            let state = session.state();
            if let Some(err) = state.error_message() {
                bail!("{}", err);
            }
            if let Some(result) = state.result() {
                println!("{}", render::status_panel(state));
                println!();
                println!("{}", render::detections_table(&result.detections));
                println!("\n✅ Analysis complete");
            }
        }

        Commands::History { action } => {
            let client = ApiClient::from_config(&config)?;
            match action {
                HistoryAction::List { limit } => {
                    let limit = limit.unwrap_or(config.history_limit);
                    let mut session = Session::new(client, AssumeYes, config.default_parameters())
                        .with_history_limit(limit);
                    session.refresh_history().await;
                    if let Some(err) = session.state().error_message() {
                        bail!("{}", err);
                    }
                    println!("{}", render::history_list(session.state().history(), None));
                }
                HistoryAction::Show { id } => {
                    let record = client.get_history_record(&id).await?;
                    println!("{}", render::history_entry(&record, false));
                    if let (Some(original), Some(annotated)) =
                        (&record.original_image_url, &record.annotated_image_url)
                    {
                        println!("  original:  {}", original);
                        println!("  annotated: {}", annotated);
                    }
                }
                HistoryAction::Delete { id, yes } => {
                    if yes {
                        delete_record(client, AssumeYes, &config, &id).await?;
                    } else {
                        delete_record(client, TerminalConfirmation, &config, &id).await?;
                    }
                }
                HistoryAction::Clear { yes } => {
                    if yes {
                        clear_history(client, AssumeYes, &config).await?;
                    } else {
                        clear_history(client, TerminalConfirmation, &config).await?;
                    }
                }
            }
        }

        Commands::Shell => {
            let client = ApiClient::from_config(&config)?;
            let mut session = Session::new(client, TerminalConfirmation, config.default_parameters())
                .with_history_limit(config.history_limit);
            shell::run_shell(&mut session).await?;
        }

        Commands::Status => {
            let client = ApiClient::from_config(&config)?;
            println!("Server: {}", client.base_url());

            let version = client.server_version().await?;
            println!("  python:      {}", version.python);
            for (name, value) in [
                ("fastapi", &version.fastapi),
                ("uvicorn", &version.uvicorn),
                ("numpy", &version.numpy),
                ("opencv", &version.opencv),
                ("torch", &version.torch),
                ("ultralytics", &version.ultralytics),
            ] {
                println!("  {:<12} {}", format!("{}:", name), value.as_deref().unwrap_or("-"));
            }
            println!("  platform:    {}", version.platform);

            let server = client.server_config().await?;
            println!("  detector:    {}", server.detector);
            println!("  weights:     {}", server.model_weights);
            println!("  upload dir:  {}", server.upload_dir);
            println!("  CORS:        {}", server.cors_origins.join(", "));
        }

        Commands::Config { set_base_url, show } => {
            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                config.save()?;
                println!("✔ Base URL saved: {}", config.base_url);
            }

            if show {
                println!("Config:");
                println!("  base URL:       {}", config.base_url);
                println!("  history limit:  {}", config.history_limit);
                println!("  timeout:        {}s", config.timeout_seconds);
                let params = config.default_parameters();
                println!("  conf:           {:.2}", params.confidence());
                println!("  max dets:       {}", params.max_detections());
                println!("  detector:       {}", params.detector());
            }
        }
    }

    Ok(())
}

/// 直近の履歴を読み込んでから1件削除する
async fn delete_record<C: Confirmation>(
    client: ApiClient,
    confirmation: C,
    config: &Config,
    id: &str,
) -> anyhow::Result<()> {
    let mut session = Session::new(client, confirmation, config.default_parameters())
        .with_history_limit(MAX_HISTORY_LIMIT);
    session.refresh_history().await;
    if let Some(err) = session.state().error_message() {
        bail!("{}", err);
    }
    if !session.state().can_delete(id) {
        bail!("Record not found in recent history: {}", id);
    }

    let before = notice_generation(session.state());
    session.delete_record(id).await;
    report_outcome(session.state(), before)
}

async fn clear_history<C: Confirmation>(
    client: ApiClient,
    confirmation: C,
    config: &Config,
) -> anyhow::Result<()> {
    let mut session = Session::new(client, confirmation, config.default_parameters())
        .with_history_limit(config.history_limit);
    let before = notice_generation(session.state());
    session.clear_history().await;
    report_outcome(session.state(), before)
}

fn notice_generation(state: &session::InteractionState) -> Option<u64> {
    state.notice().map(|n| n.generation)
}

/// 操作後の通知を表示する。通知が変わっていなければ確認で取り消された
fn report_outcome(state: &session::InteractionState, before: Option<u64>) -> anyhow::Result<()> {
    if notice_generation(state) == before {
        println!("Cancelled.");
        return Ok(());
    }
    if let Some(err) = state.error_message() {
        bail!("{}", err);
    }
    match state.info_message() {
        Some(info) => println!("✔ {}", info),
        None => println!("Cancelled."),
    }
    Ok(())
}
