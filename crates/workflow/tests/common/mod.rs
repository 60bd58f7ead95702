use std::collections::VecDeque;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::{ImageFormat, Rgb, RgbImage};
use symbolart_client::api::{ConversionError, ConversionRequest, ConversionService, ConvertedImage};
use symbolart_core::image_info::inspect_image;
use symbolart_core::settings::SettingsStore;
use symbolart_core::source::SourceImage;
use symbolart_workflow::export::ArtifactSink;
use symbolart_workflow::{TransformationWorkflow, WorkflowState};
use tokio::sync::{oneshot, watch};

pub type Reply = Result<ConvertedImage, ConversionError>;

/// Conversion service whose responses are handed out by the test.
///
/// Each call records its request and waits on the next queued reply, so
/// a test can hold a request in flight for as long as it needs.
#[derive(Default)]
pub struct ScriptedService {
    calls: Mutex<Vec<ConversionRequest>>,
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
}

impl ScriptedService {
    /// Queue a reply slot and return the sender that fills it.
    pub fn hold_reply(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(rx);
        tx
    }

    /// Queue a reply that is available immediately.
    pub fn reply_with(&self, reply: Reply) {
        let tx = self.hold_reply();
        let _ = tx.send(reply);
    }

    pub fn calls(&self) -> Vec<ConversionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl ConversionService for ScriptedService {
    async fn convert(&self, request: &ConversionRequest) -> Reply {
        self.calls.lock().unwrap().push(request.clone());
        let rx = self.replies.lock().unwrap().pop_front();
        let dropped = || ConversionError::Service {
            status: 503,
            message: "no scripted reply".into(),
        };
        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(dropped())),
            None => Err(dropped()),
        }
    }
}

/// Sink that keeps every save in memory.
#[derive(Default)]
pub struct RecordingSink {
    saves: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn saves(&self) -> Vec<(String, Vec<u8>)> {
        self.saves.lock().unwrap().clone()
    }
}

impl ArtifactSink for RecordingSink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, std::io::Error> {
        self.saves
            .lock()
            .unwrap()
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([90, 60, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn converted(bytes: Vec<u8>) -> ConvertedImage {
    let info = inspect_image(&bytes).unwrap();
    ConvertedImage {
        bytes,
        content_type: Some("image/png".into()),
        info,
    }
}

pub fn service_error(status: u16, message: &str) -> ConversionError {
    ConversionError::Service {
        status,
        message: message.into(),
    }
}

pub fn cat_photo() -> SourceImage {
    SourceImage::new("cat.jpg", "image/jpeg", b"cat-photo-bytes".to_vec())
}

pub fn dog_photo() -> SourceImage {
    SourceImage::new("dog.png", "image/png", b"dog-photo-bytes".to_vec())
}

pub type TestWorkflow = TransformationWorkflow<Arc<ScriptedService>, Arc<RecordingSink>>;

pub fn new_workflow() -> (TestWorkflow, Arc<ScriptedService>, Arc<RecordingSink>) {
    let service = Arc::new(ScriptedService::default());
    let sink = Arc::new(RecordingSink::default());
    let workflow = TransformationWorkflow::new(service.clone(), sink.clone(), SettingsStore::new());
    (workflow, service, sink)
}

/// Wait until the workflow reports `Submitting`.
pub async fn wait_for_submitting(rx: &mut watch::Receiver<WorkflowState>) {
    rx.wait_for(|s| *s == WorkflowState::Submitting)
        .await
        .unwrap();
}
