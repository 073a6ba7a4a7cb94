//! Background Worker - 旁白后台任务处理

mod narration_worker;

pub use narration_worker::{
    NarrationHandle, NarrationJob, NarrationWorker, NarrationWorkerConfig, WorkerError,
};
