use analyzer_common::DetectorMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-analyzer")]
#[command(about = "Image Analyzer - YOLO & OpenCV based image analysis client", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドのベースURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を1枚解析して検出結果を表示
    Analyze {
        /// 画像ファイルのパス
        #[arg(required = true)]
        file: PathBuf,

        /// 最小信頼度 (0.0-1.0、範囲外はクランプ)
        #[arg(long)]
        conf: Option<String>,

        /// 最大検出数 (1-3000、範囲外はクランプ)
        #[arg(long)]
        max_dets: Option<String>,

        /// 検出エンジン (auto/yolo/contour)
        #[arg(short, long)]
        detector: Option<DetectorMode>,
    },

    /// 解析履歴の操作
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// 対話モード
    Shell,

    /// サーバーのバージョン・設定を表示
    Status,

    /// 設定を表示/編集
    Config {
        /// ベースURLを保存
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// 最近の解析を一覧表示
    List {
        /// 取得件数（省略時は設定値）
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 1件の詳細を表示
    Show {
        #[arg(required = true)]
        id: String,
    },

    /// 1件削除（画像ファイルも削除される）
    Delete {
        #[arg(required = true)]
        id: String,

        /// 確認を省略
        #[arg(short, long)]
        yes: bool,
    },

    /// 全件削除
    Clear {
        /// 確認を省略
        #[arg(short, long)]
        yes: bool,
    },
}
