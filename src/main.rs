use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use tracing::info;

use sonarnav::logging::{LogConfig, LogOutput, init_logging, level_for_verbosity, parse_log_level};
use sonarnav::scenario::ScenarioConfig;
use sonarnav::simulation::SimulationEngine;

const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.yaml");

fn main() -> Result<()> {
    let matches = Command::new("sonarnav")
        .version("0.1.0")
        .about("ソナー航行エンジン (Sonar Navigation)")
        .long_about(
            "方位観測からクリーチャーの位置を推定し、\n\
             モンスターとの衝突を避けながらドローンを誘導するターン制シミュレーターです。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .conflicts_with("demo"),
        )
        .arg(
            Arg::new("demo")
                .short('d')
                .long("demo")
                .action(ArgAction::SetTrue)
                .help("組み込みのデモシナリオを実行"),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 進行状況, -vv: 判断, -vvv: 指令)"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .value_parser(clap::value_parser!(String))
                .default_value("console")
                .help("ログ出力先 (console, file, both)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)。-v より優先"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルの出力ディレクトリ"),
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let output = matches
        .get_one::<String>("log-output")
        .map(|s| s.parse::<LogOutput>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or(LogOutput::Console);
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or_else(|| level_for_verbosity(verbose_level));
    let log_config = LogConfig {
        level,
        output,
        log_dir: matches
            .get_one::<String>("log-dir")
            .cloned()
            .unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };
    let _guard = init_logging(&log_config).context("ログの初期化に失敗しました")?;

    let scenario = if let Some(path) = matches.get_one::<String>("scenario") {
        let scenario = ScenarioConfig::from_file(path)?;
        info!(path = %path, "SCENARIO_LOADED: シナリオを読み込みました");
        scenario
    } else if matches.get_flag("demo") {
        ScenarioConfig::from_yaml_str(DEMO_SCENARIO).context("デモシナリオが不正です")?
    } else {
        show_default_help();
        return Ok(());
    };

    scenario.print_summary();
    if matches.get_flag("info") {
        return Ok(());
    }
    println!();

    let mut engine = SimulationEngine::new(scenario, verbose_level);
    let stats = engine.run()?;

    println!("=== 実行結果 ===");
    println!("ターン数: {}", stats.turns);
    println!("スキャン数: {}", stats.scans);
    println!("回避回数: {}", stats.escapes);
    println!("回避不能: {}", stats.stranded);
    println!("衝突回数: {}", stats.collisions);

    Ok(())
}

fn show_default_help() {
    println!("使用方法:");
    println!("  sonarnav [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>   シナリオファイルを指定して実行");
    println!("  -d, --demo              組み込みのデモシナリオを実行");
    println!("  -i, --info              シナリオ情報のみ表示");
    println!("  -v, --verbose           詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-output <OUT>  ログ出力先 (console, file, both)");
    println!("      --log-level <LEVEL> ログレベル");
    println!("      --log-dir <DIR>     ログファイルの出力ディレクトリ");
    println!();
    println!("例:");
    println!("  sonarnav --demo -v");
    println!("  sonarnav -s scenarios/demo.yaml -i");
    println!("  sonarnav -s scenarios/demo.yaml --log-output both --log-level debug");
}
