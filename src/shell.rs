//! 対話モード
//!
//! 1回のループで「期限切れ通知の削除 → 描画 → 操作選択 → ハンドラ実行」を行う。
//! ハンドラは完了まで走り切ってから次のメニューを出す。

use crate::client::AnalysisBackend;
use crate::confirm::Confirmation;
use crate::error::Result;
use crate::render;
use crate::session::Session;
use crate::upload::SelectedFile;
use analyzer_common::{parse_confidence, parse_max_detections, DetectorMode};
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ChooseFile,
    Analyze,
    SetConfidence,
    SetMaxDetections,
    SetDetector,
    ShowDetections,
    RefreshHistory,
    ShowHistory,
    DeleteRecord,
    ClearAll,
    Quit,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::ChooseFile => "Choose file",
            Action::Analyze => "Analyze",
            Action::SetConfidence => "Set confidence",
            Action::SetMaxDetections => "Set max detections",
            Action::SetDetector => "Set detector",
            Action::ShowDetections => "Show detections",
            Action::RefreshHistory => "Refresh history",
            Action::ShowHistory => "Show recent uploads",
            Action::DeleteRecord => "Delete a record",
            Action::ClearAll => "Clear all history",
            Action::Quit => "Quit",
        }
    }
}

/// 現在の状態で押せる操作だけを並べる
fn available_actions<B, C>(session: &Session<B, C>) -> Vec<Action>
where
    B: AnalysisBackend,
    C: Confirmation,
{
    let state = session.state();
    let mut actions = vec![Action::ChooseFile];
    if state.selected_file().is_some() && !state.is_analyzing() {
        actions.push(Action::Analyze);
    }
    actions.extend([Action::SetConfidence, Action::SetMaxDetections, Action::SetDetector]);
    if state.result().is_some() {
        actions.push(Action::ShowDetections);
    }
    actions.extend([Action::RefreshHistory, Action::ShowHistory]);
    if !state.history().is_empty() {
        actions.push(Action::DeleteRecord);
        if !state.is_clearing() {
            actions.push(Action::ClearAll);
        }
    }
    actions.push(Action::Quit);
    actions
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub async fn run_shell<B, C>(session: &mut Session<B, C>) -> Result<()>
where
    B: AnalysisBackend,
    C: Confirmation,
{
    println!("🔎 image-analyzer - interactive mode\n");
    session.load_history().await;

    loop {
        session.expire_notices();
        println!("\n{}", render::status_panel(session.state()));
        if let Some(notice) = session.state().notice() {
            println!("{}", render::notice_line(notice));
        }

        let actions = available_actions(session);
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[choice] {
            Action::ChooseFile => choose_file(session)?,
            Action::Analyze => {
                let pb = spinner("Analyzing...");
                session.submit().await;
                pb.finish_and_clear();
                if let Some(result) = session.state().result() {
                    println!("{}", render::detections_table(&result.detections));
                }
            }
            Action::SetConfidence => {
                let current = session.state().params().confidence();
                let input: String = Input::new()
                    .with_prompt("Confidence (0.0-1.0)")
                    .with_initial_text(format!("{:.2}", current))
                    .interact_text()?;
                match parse_confidence(&input) {
                    Ok(value) => {
                        session.params_mut().set_confidence(value);
                    }
                    Err(err) => eprintln!("✖ {}", err),
                }
            }
            Action::SetMaxDetections => {
                let current = session.state().params().max_detections();
                let input: String = Input::new()
                    .with_prompt("Max detections (1-3000)")
                    .with_initial_text(current.to_string())
                    .allow_empty(true)
                    .interact_text()?;
                match parse_max_detections(&input) {
                    Ok(value) => {
                        session.params_mut().set_max_detections(value as i64);
                    }
                    Err(err) => eprintln!("✖ {}", err),
                }
            }
            Action::SetDetector => {
                let current = session.state().params().detector();
                let labels: Vec<&str> = DetectorMode::ALL.iter().map(|d| d.label()).collect();
                let default = DetectorMode::ALL.iter().position(|d| *d == current).unwrap_or(0);
                let idx = Select::new()
                    .with_prompt("Detector")
                    .items(&labels)
                    .default(default)
                    .interact()?;
                session.params_mut().set_detector(DetectorMode::ALL[idx]);
            }
            Action::ShowDetections => {
                if let Some(result) = session.state().result() {
                    println!("{}", render::detections_table(&result.detections));
                }
            }
            Action::RefreshHistory => {
                session.refresh_history().await;
                println!(
                    "{}",
                    render::history_list(session.state().history(), session.state().busy_record_id())
                );
            }
            Action::ShowHistory => {
                println!(
                    "{}",
                    render::history_list(session.state().history(), session.state().busy_record_id())
                );
            }
            Action::DeleteRecord => {
                let mut items: Vec<String> = session
                    .state()
                    .history()
                    .iter()
                    .map(|r| format!("{} ({})", r.filename, r.id))
                    .collect();
                items.push("Cancel".to_string());
                let idx = Select::new()
                    .with_prompt("Record to delete")
                    .items(&items)
                    .default(items.len() - 1)
                    .interact()?;
                let target = session.state().history().get(idx).map(|r| r.id.clone());
                if let Some(id) = target {
                    session.delete_record(&id).await;
                }
            }
            Action::ClearAll => session.clear_history().await,
            Action::Quit => break,
        }
    }

    Ok(())
}

/// 空欄なら選択解除
fn choose_file<B, C>(session: &mut Session<B, C>) -> Result<()>
where
    B: AnalysisBackend,
    C: Confirmation,
{
    let input: String = Input::new()
        .with_prompt("Image path (empty to clear)")
        .allow_empty(true)
        .interact_text()?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        session.select_file(None);
        return Ok(());
    }

    match SelectedFile::from_path(Path::new(trimmed)) {
        Ok(file) => session.select_file(Some(file)),
        Err(err) => eprintln!("✖ {}: {}", trimmed, err),
    }
    Ok(())
}
