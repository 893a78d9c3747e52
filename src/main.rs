use clap::{Arg, ArgAction, Command, value_parser};
use pursuitsim::logging::{LogConfig, LogOutput, init_logging, level_for_verbosity, parse_log_level};
use pursuitsim::presenter::{ConsolePresenter, print_report};
use pursuitsim::scenario::ScenarioConfig;
use pursuitsim::simulation::{CancelFlag, SimulationEngine};
use std::time::Duration;
use tracing::{info, warn};

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("pursuitsim")
        .version("0.1.0")
        .about("追跡シミュレーション (Pursuit Simulation)")
        .long_about("開ループで移動する逃避側を、PID制御の追跡側が迎撃する\n\
                     2次元の時間駆動型シミュレーションです。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、組み込みの既定シナリオで実行されます。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("max-steps")
                .long("max-steps")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("ステップ上限を上書き")
        )
        .arg(
            Arg::new("step-cap")
                .long("step-cap")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("早期打ち切りステップ数を上書き (0で打ち切りなし)")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("追跡側の初期位置を決める乱数シード")
        )
        .arg(
            Arg::new("frame-delay-ms")
                .long("frame-delay-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .help("1ティックごとの待機時間 (リアルタイム表示用)")
        )
        .arg(
            Arg::new("echo")
                .long("echo")
                .action(ArgAction::SetTrue)
                .help("各ティックの位置とPID成分を表示")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .value_parser(value_parser!(LogOutput))
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or_else(|| level_for_verbosity(verbose_level)),
        output: matches
            .get_one::<LogOutput>("log-output")
            .copied()
            .unwrap_or(LogOutput::Console),
        ..LogConfig::default()
    };
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {}", e);
            None
        }
    };

    println!("追跡シミュレーション (Pursuit Simulation) - pursuitsim v0.1.0");
    println!();

    if let Err(e) = run(&matches, verbose_level) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// シナリオを読み込み、CLI引数を反映して実行
fn run(matches: &clap::ArgMatches, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario = match matches.get_one::<String>("scenario") {
        Some(path) => {
            let scenario = ScenarioConfig::from_file(path)?;
            if verbose_level > 0 {
                println!("シナリオファイル読み込み完了: {}", path);
            }
            scenario
        }
        None => ScenarioConfig::default(),
    };

    if let Some(max_steps) = matches.get_one::<u64>("max-steps") {
        scenario.sim.max_steps = *max_steps;
    }
    if let Some(cap) = matches.get_one::<u64>("step-cap") {
        scenario.sim.step_cap = (*cap > 0).then_some(*cap);
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        scenario.sim.seed = *seed;
    }
    scenario.validate()?;

    scenario.print_summary();
    println!();

    if matches.get_flag("info") {
        return Ok(());
    }

    let frame_delay = matches
        .get_one::<u64>("frame-delay-ms")
        .map(|ms| Duration::from_millis(*ms));
    let mut presenter = ConsolePresenter::new(matches.get_flag("echo"), frame_delay);

    // Ctrl-C をウィンドウクローズ相当の停止要求として扱う
    let cancel = CancelFlag::new();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let signal_flag = cancel.clone();
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("停止要求を受信しました");
                signal_flag.cancel();
            }
            Err(e) => warn!("シグナルハンドラの登録に失敗しました: {}", e),
        }
    });

    let mut engine = SimulationEngine::new(&scenario, verbose_level)?;
    let result = engine.run(&mut presenter, &cancel)?;

    print_report(&result);

    runtime.shutdown_background();
    Ok(())
}
