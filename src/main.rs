// src/main.rs

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;

use dronesize::config::load_parameters::{load_mission, load_optimizer_config, load_reference_parameters};
use dronesize::optimization::clip;
use dronesize::report::{format_table, setup_csv_output, write_report_csv};
use dronesize::run::run_sizing;
use dronesize::sizing::{DesignVector, SizingEvaluator};
use dronesize::Strategy;

#[derive(Parser, Debug)]
#[command(name = "dronesize")]
#[command(about = "マルチコプタの推進系・構造のサイジング最適化")]
struct Cli {
    /// ミッション仕様 (未指定なら config/mission.yaml、無ければ既定値)
    #[arg(long)]
    mission: Option<PathBuf>,

    /// 基準パラメータ (未指定なら config/reference.yaml、無ければ既定値)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// 最適化設定 (未指定なら config/optimizer.yaml、無ければ既定値)
    #[arg(long)]
    optimizer: Option<PathBuf>,

    /// 探索戦略（設定ファイルの値を上書き）
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// 差分進化の乱数シード（設定ファイルの値を上書き）
    #[arg(long)]
    seed: Option<u64>,

    /// 最適化せず初期点だけを評価する
    #[arg(long)]
    evaluate_only: bool,

    /// レポートのCSV出力先
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// 明示されたパスを優先し、無ければ既定の場所にあるファイルを使う
fn resolve(explicit: Option<PathBuf>, fallback: &str) -> Option<PathBuf> {
    explicit.or_else(|| {
        let path = Path::new(fallback);
        path.exists().then(|| path.to_path_buf())
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // 設定の読み込み
    let mission = load_mission(resolve(cli.mission, "config/mission.yaml").as_deref())?;
    let reference = load_reference_parameters(resolve(cli.reference, "config/reference.yaml").as_deref())?;
    let mut optimizer = load_optimizer_config(resolve(cli.optimizer, "config/optimizer.yaml").as_deref())?;
    if let Some(strategy) = cli.strategy {
        optimizer.strategy = strategy;
    }
    if let Some(seed) = cli.seed {
        optimizer.solver.global.seed = Some(seed);
    }

    let (report, result) = if cli.evaluate_only {
        let evaluator = SizingEvaluator::new(mission.mission, mission.architecture, reference)?
            .with_penalty_weight(optimizer.penalty_weight)?;
        let start = DesignVector::from_array(clip(&optimizer.initial.to_array(), &optimizer.bounds()));
        (evaluator.size(&start)?, None)
    } else {
        let run = run_sizing(&mission, &reference, &optimizer)?;
        (run.report, Some(run.result))
    };

    print!("{}", format_table(&report, result.as_ref()));

    // CSV出力
    if let Some(path) = cli.output {
        let mut writer = setup_csv_output(&path)?;
        write_report_csv(&mut writer, &report, result.as_ref())?;
        info!("レポートを {} に書き出しました", path.display());
    }

    Ok(())
}
