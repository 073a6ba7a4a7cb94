//! espeak-ng Engine - 调用本地 espeak-ng 命令行合成器
//!
//! 实现 EngineAdapter trait：
//! - 属性保存在适配器内，入队时连同文本一起快照
//! - flush 时按顺序为每段文本启动一次 espeak-ng 并等待其退出
//!
//! 命令行:
//! espeak-ng -s <wpm> -a <amplitude> -v <voice> --stdin

use std::collections::VecDeque;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::application::ports::{EngineAdapter, EngineError};
use crate::domain::voice::{VoiceDescriptor, VoiceGender, VoiceId};

/// espeak-ng 引擎配置
#[derive(Debug, Clone)]
pub struct EspeakEngineConfig {
    /// 可执行文件
    pub program: String,
    /// 初始语速（每分钟词数）
    pub rate: u32,
    /// 初始音量 (0.0 - 1.0)
    pub volume: f32,
    /// 初始音色
    pub voice: String,
    /// espeak-ng 接受的语速范围
    pub min_rate: u32,
    pub max_rate: u32,
}

impl Default for EspeakEngineConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            rate: 175,
            volume: 1.0,
            voice: "en".to_string(),
            min_rate: 80,
            max_rate: 450,
        }
    }
}

/// 排队中的文本
#[derive(Debug, Clone)]
struct QueuedUtterance {
    text: String,
    rate: u32,
    amplitude: u32,
    voice: VoiceId,
}

/// espeak-ng 引擎
pub struct EspeakEngine {
    config: EspeakEngineConfig,
    catalog: Vec<VoiceDescriptor>,
    rate: u32,
    volume: f32,
    voice: VoiceId,
    queue: VecDeque<QueuedUtterance>,
}

impl EspeakEngine {
    /// 创建引擎
    ///
    /// espeak-ng 不可用时直接返回 `EngineError::Unavailable`
    pub fn new(config: EspeakEngineConfig) -> Result<Self, EngineError> {
        let output = Command::new(&config.program)
            .arg("--version")
            .output()
            .map_err(|e| {
                EngineError::Unavailable(format!("Cannot run {}: {}", config.program, e))
            })?;
        if !output.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --version exited with {}",
                config.program, output.status
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if !(0.0..=1.0).contains(&config.volume) {
            return Err(EngineError::invalid_property(
                "volume",
                format!("initial volume {} is outside 0.0..=1.0", config.volume),
            ));
        }

        let catalog = Self::query_voices(&config.program)?;

        tracing::info!(
            program = %config.program,
            version = %version,
            voices = catalog.len(),
            "EspeakEngine initialized"
        );

        Ok(Self {
            rate: config.rate.clamp(config.min_rate, config.max_rate),
            volume: config.volume,
            voice: VoiceId::new(config.voice.clone()),
            config,
            catalog,
            queue: VecDeque::new(),
        })
    }

    fn query_voices(program: &str) -> Result<Vec<VoiceDescriptor>, EngineError> {
        let output = Command::new(program).arg("--voices").output()?;
        if !output.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --voices exited with {}",
                program, output.status
            )));
        }
        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// 音量映射到 espeak 振幅（100 为默认音量）
    fn amplitude(volume: f32) -> u32 {
        (volume * 100.0).round() as u32
    }

    fn speak(&self, utterance: &QueuedUtterance) -> Result<(), EngineError> {
        tracing::debug!(
            rate = utterance.rate,
            amplitude = utterance.amplitude,
            voice = %utterance.voice,
            text_len = utterance.text.len(),
            "Speaking utterance"
        );

        let mut child = Command::new(&self.config.program)
            .arg("-s")
            .arg(utterance.rate.to_string())
            .arg("-a")
            .arg(utterance.amplitude.to_string())
            .arg("-v")
            .arg(utterance.voice.as_str())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;

        // 写完后 drop stdin，espeak-ng 读到 EOF 才开始朗读
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(utterance.text.as_bytes()) {
                drop(stdin);
                // 写入失败也要回收子进程
                if let Err(kill_err) = child.kill() {
                    tracing::debug!(error = %kill_err, "espeak-ng already exited");
                }
                child.wait()?;
                return Err(e.into());
            }
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(EngineError::ProcessFailed(format!(
                "{} exited with {}",
                self.config.program, status
            )));
        }
        Ok(())
    }
}

impl EngineAdapter for EspeakEngine {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn get_rate(&self) -> Result<u32, EngineError> {
        Ok(self.rate)
    }

    fn get_volume(&self) -> Result<f32, EngineError> {
        Ok(self.volume)
    }

    fn get_voice(&self) -> Result<VoiceId, EngineError> {
        Ok(self.voice.clone())
    }

    fn set_rate(&mut self, rate: u32) -> Result<(), EngineError> {
        let clamped = rate.clamp(self.config.min_rate, self.config.max_rate);
        if clamped != rate {
            tracing::warn!(
                requested = rate,
                applied = clamped,
                "Rate outside espeak-ng range, clamped"
            );
        }
        self.rate = clamped;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(EngineError::invalid_property(
                "volume",
                format!("{} is outside 0.0..=1.0", volume),
            ));
        }
        self.volume = volume;
        Ok(())
    }

    fn set_voice(&mut self, voice: &VoiceId) -> Result<(), EngineError> {
        let known = voice.as_str() == self.config.voice
            || self.catalog.iter().any(|v| &v.id == voice);
        if !known {
            return Err(EngineError::VoiceNotFound(voice.clone()));
        }
        self.voice = voice.clone();
        Ok(())
    }

    fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, EngineError> {
        Ok(self.catalog.clone())
    }

    fn enqueue_speech(&mut self, text: &str) -> Result<(), EngineError> {
        self.queue.push_back(QueuedUtterance {
            text: text.to_string(),
            rate: self.rate,
            amplitude: Self::amplitude(self.volume),
            voice: self.voice.clone(),
        });
        Ok(())
    }

    fn flush_and_wait(&mut self) -> Result<(), EngineError> {
        let queued = std::mem::take(&mut self.queue);
        tracing::debug!(utterances = queued.len(), "Flushing speech queue");
        for utterance in &queued {
            self.speak(utterance)?;
        }
        Ok(())
    }
}

/// 解析 `espeak-ng --voices` 输出
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<VoiceDescriptor> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(parse_voice_line)
        .collect()
}

fn parse_voice_line(line: &str) -> Option<VoiceDescriptor> {
    let mut fields = line.split_whitespace();
    let _priority = fields.next()?;
    let language = fields.next()?;
    let age_gender = fields.next()?;
    let name = fields.next()?;
    let _file = fields.next();
    let others = fields.collect::<Vec<_>>().join(" ");

    let (age, gender) = age_gender.split_once('/').unwrap_or((age_gender, ""));

    let mut languages = vec![language.to_string()];
    languages.extend(
        others
            .split(')')
            .filter_map(|item| item.trim().strip_prefix('('))
            .filter_map(|item| item.split_whitespace().next())
            .map(str::to_string),
    );

    let mut descriptor =
        VoiceDescriptor::new(language, name.replace('_', " ")).with_languages(languages);
    descriptor.gender = match gender {
        "M" => Some(VoiceGender::Male),
        "F" => Some(VoiceGender::Female),
        "" | "-" | "--" => None,
        _ => Some(VoiceGender::Unknown),
    };
    descriptor.age = age.parse().ok();
    Some(descriptor)
}
