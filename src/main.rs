//! Narrator - 带内联控制标签的旁白朗读
//!
//! 子命令:
//! - speak: 朗读文本（参数、文件或标准输入）
//! - voices: 列出引擎音色及角色解析结果
//! - lex: 打印文本的片段序列

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use narrator::application::{
    ListVoices, ListVoicesHandler, NarrateHandler, NarrationReport, VoiceCatalogResponse,
};
use narrator::config::{load_config_from_path, print_config, AppConfig};
use narrator::domain::narration::tokenize;
use narrator::domain::VoiceId;
use narrator::infrastructure::adapters::{
    EngineJournal, EspeakEngine, EspeakEngineConfig, FakeEngine, FakeEngineConfig,
};
use narrator::infrastructure::worker::{NarrationWorker, NarrationWorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "narrator", about = "Speak text with inline <rate>, <volume> and <voice> tags")]
struct Cli {
    /// Path to narrator.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Record engine calls instead of driving espeak-ng
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Speak tagged text (from the argument, --file, or stdin)
    Speak {
        text: Option<String>,

        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// List engine voices and the detected male/female voices
    Voices {
        #[arg(long)]
        json: bool,
    },
    /// Print the segment sequence of tagged text
    Lex { text: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config, cli.verbose);
    print_config(&config);

    match cli.command {
        Command::Speak { text, file } => {
            let text = read_input(text, file).await?;
            speak(&config, cli.dry_run, text).await
        }
        Command::Voices { json } => list_voices(&config, cli.dry_run, json),
        Command::Lex { text } => {
            for token in tokenize(&text) {
                println!("{:<24} {:?}", token.segment.to_string(), token.raw);
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &AppConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.log.level.as_str() };
    let log_filter = format!("warn,narrator={}", level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn read_input(text: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return Ok(tokio::fs::read_to_string(&path).await?);
    }
    let mut buffer = String::new();
    tokio::io::stdin().read_to_string(&mut buffer).await?;
    Ok(buffer)
}

/// 创建引擎；dry-run 时返回带示例音色的 Fake 引擎及其调用日志
fn build_engine(
    config: &AppConfig,
    dry_run: bool,
) -> anyhow::Result<(Box<dyn narrator::application::EngineAdapter>, Option<EngineJournal>)> {
    if dry_run {
        let engine = FakeEngine::new(FakeEngineConfig {
            rate: config.engine.rate,
            volume: config.engine.volume,
            voice: VoiceId::new(config.engine.voice.clone()),
            ..FakeEngineConfig::default().with_sample_catalog()
        });
        let journal = engine.journal();
        return Ok((Box::new(engine), Some(journal)));
    }

    let engine_config = EspeakEngineConfig {
        program: config.engine.program.clone(),
        rate: config.engine.rate,
        volume: config.engine.volume,
        voice: config.engine.voice.clone(),
        min_rate: config.engine.min_rate,
        max_rate: config.engine.max_rate,
    };
    // 引擎不可用时在会话开始前就失败
    let engine = EspeakEngine::new(engine_config)
        .map_err(|e| anyhow::anyhow!("Speech engine unavailable: {}", e))?;
    Ok((Box::new(engine), None))
}

async fn speak(config: &AppConfig, dry_run: bool, text: String) -> anyhow::Result<()> {
    let (engine, journal) = build_engine(config, dry_run)?;

    let handler = NarrateHandler::new(config.voices.heuristics(), config.narration.options());
    let worker_config = NarrationWorkerConfig {
        queue_capacity: config.narration.queue_capacity,
    };
    let (worker, handle) = NarrationWorker::new(worker_config, engine, handler);
    let worker_task = tokio::spawn(worker.run());

    let result = handle.narrate(text).await;

    drop(handle);
    worker_task.await?;

    let report = result?;
    print_report(&report);

    if let Some(journal) = journal {
        println!();
        println!("Engine calls:");
        for call in journal.calls() {
            println!("  {}", call);
        }
    }

    Ok(())
}

fn print_report(report: &NarrationReport) {
    let elapsed = report.finished_at - report.started_at;
    println!(
        "Session {}: {} utterance(s), {} directive(s) applied, {} skipped, {} ms",
        report.session_id,
        report.utterances.len(),
        report.directives_applied,
        report.directives_skipped,
        elapsed.num_milliseconds()
    );
    for utterance in &report.utterances {
        println!(
            "  [rate={} volume={} voice={}] {:?}",
            utterance.rate, utterance.volume, utterance.voice, utterance.text
        );
    }
}

fn list_voices(config: &AppConfig, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let (engine, _journal) = build_engine(config, dry_run)?;
    let handler = ListVoicesHandler::new(config.voices.heuristics());
    let response = handler.handle(engine.as_ref(), ListVoices)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_catalog(&response);
    }
    Ok(())
}

fn print_catalog(response: &VoiceCatalogResponse) {
    println!("--- Available Voices ---");
    for voice in &response.voices {
        println!("ID: {}", voice.id);
        println!("  Name: {}", voice.name);
        println!(
            "  Age: {}",
            voice.age.map_or_else(|| "-".to_string(), |age| age.to_string())
        );
        println!(
            "  Gender: {}",
            voice.gender.map_or("-", |gender| gender.as_str())
        );
        println!("  Languages: {}", voice.languages.join(", "));
    }

    let show = |id: &Option<VoiceId>| {
        id.as_ref()
            .map_or_else(|| "(none)".to_string(), |id| id.to_string())
    };
    println!();
    println!("--- Detected Voices ---");
    println!("Male voice ID: {}", show(&response.resolution.male_id));
    println!("Female voice ID: {}", show(&response.resolution.female_id));
}
