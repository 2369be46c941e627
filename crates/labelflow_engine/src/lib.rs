//! LabelFlow engine: processing-service client, poller and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod poller;
mod types;
mod wire;

pub use client::{ClientSettings, ProcessingClient, ReqwestProcessingClient};
pub use engine::{EngineConfig, EngineError, EngineEvents, EngineHandle};
pub use filename::{content_disposition_filename, safe_file_name};
pub use persist::{ensure_output_dir, AtomicFileWriter, Collision, PersistError};
pub use poller::{ChannelEventSink, EventSink, PollRequest, Poller};
pub use types::{
    ClientError, CycleId, DownloadedArchive, EngineEvent, FailureKind, RemoteState, RemoteStatus,
    Upload,
};
