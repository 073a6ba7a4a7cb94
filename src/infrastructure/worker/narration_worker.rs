//! Narration Worker - Background Narration Processor
//!
//! Worker 独占一个引擎实例，从队列按提交顺序逐个执行旁白任务；
//! 会话在阻塞线程池中运行，调用方不会被 flush_and_wait 阻塞。

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::application::commands::handlers::NarrateHandler;
use crate::application::commands::NarrateCommand;
use crate::application::error::SynthesisError;
use crate::application::ports::EngineAdapter;
use crate::application::session::NarrationReport;

/// Worker 错误
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Narration worker stopped")]
    Stopped,

    #[error("Engine lock poisoned by a previous session")]
    EnginePoisoned,

    #[error("Narration task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Worker 配置
#[derive(Debug, Clone)]
pub struct NarrationWorkerConfig {
    /// 排队任务上限，满时提交方等待
    pub queue_capacity: usize,
}

impl Default for NarrationWorkerConfig {
    fn default() -> Self {
        Self { queue_capacity: 16 }
    }
}

type ReplySender = oneshot::Sender<Result<NarrationReport, WorkerError>>;

/// 旁白任务
pub struct NarrationJob {
    pub command: NarrateCommand,
    reply: Option<ReplySender>,
}

/// 提交旁白任务的句柄
///
/// 所有句柄都被 drop 后 Worker 退出
#[derive(Clone)]
pub struct NarrationHandle {
    sender: mpsc::Sender<NarrationJob>,
}

impl NarrationHandle {
    /// 提交并等待会话完成
    pub async fn narrate(&self, text: impl Into<String>) -> Result<NarrationReport, WorkerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(NarrationJob {
                command: NarrateCommand::new(text),
                reply: Some(reply),
            })
            .await
            .map_err(|_| WorkerError::Stopped)?;

        response.await.map_err(|_| WorkerError::Stopped)?
    }

    /// 只提交，不等待结果（失败只记录日志）
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), WorkerError> {
        self.sender
            .send(NarrationJob {
                command: NarrateCommand::new(text),
                reply: None,
            })
            .await
            .map_err(|_| WorkerError::Stopped)
    }
}

/// 旁白 Worker
pub struct NarrationWorker {
    config: NarrationWorkerConfig,
    queue_receiver: mpsc::Receiver<NarrationJob>,
    engine: Arc<Mutex<Box<dyn EngineAdapter>>>,
    handler: Arc<NarrateHandler>,
}

impl NarrationWorker {
    pub fn new(
        config: NarrationWorkerConfig,
        engine: Box<dyn EngineAdapter>,
        handler: NarrateHandler,
    ) -> (Self, NarrationHandle) {
        let (sender, queue_receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = Self {
            config,
            queue_receiver,
            engine: Arc::new(Mutex::new(engine)),
            handler: Arc::new(handler),
        };
        (worker, NarrationHandle { sender })
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            queue_capacity = self.config.queue_capacity,
            "NarrationWorker started"
        );

        // 逐个处理，保证同一引擎上同时只有一个会话
        while let Some(job) = self.queue_receiver.recv().await {
            let NarrationJob { command, reply } = job;
            let text_len = command.text.len();

            let result = Self::process_job(command, self.engine.clone(), self.handler.clone()).await;

            match &result {
                Ok(report) => tracing::debug!(
                    session_id = %report.session_id,
                    text_len = text_len,
                    "Narration job completed"
                ),
                Err(e) => tracing::error!(text_len = text_len, error = %e, "Narration job failed"),
            }

            if let Some(reply) = reply {
                if reply.send(result).is_err() {
                    tracing::debug!("Narration caller went away before completion");
                }
            }
        }

        tracing::info!("NarrationWorker stopped");
    }

    /// 在阻塞线程池中执行单个会话
    async fn process_job(
        command: NarrateCommand,
        engine: Arc<Mutex<Box<dyn EngineAdapter>>>,
        handler: Arc<NarrateHandler>,
    ) -> Result<NarrationReport, WorkerError> {
        tokio::task::spawn_blocking(move || {
            let mut engine = engine.lock().map_err(|_| WorkerError::EnginePoisoned)?;
            handler
                .handle(&mut **engine, command)
                .map_err(WorkerError::from)
        })
        .await
        .map_err(|e| WorkerError::TaskFailed(e.to_string()))?
    }
}
