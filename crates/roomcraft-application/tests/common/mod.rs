//! Shared test tooling: a scripted generation client and workflow helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use roomcraft_application::{GenerationOrchestrator, RoomWorkflow};
use roomcraft_core::error::{Result, RoomcraftError};
use roomcraft_core::generation::{GenerationClient, GenerationRequest, GenerationTask};
use roomcraft_core::media::ImageHandle;
use roomcraft_core::room::RoomStatus;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

type TextScript = Arc<dyn Fn(&GenerationRequest) -> String + Send + Sync>;

/// Generation client driven entirely by the test.
///
/// - image tasks answer with a fixed image per task (default: the task name
///   as bytes, so every task's output is distinguishable);
/// - text tasks answer with a scripted string (default `[]`);
/// - any task can be made to fail or to wait on a gate.
#[derive(Default)]
pub struct StubClient {
    requests: Mutex<Vec<GenerationRequest>>,
    images: Mutex<HashMap<GenerationTask, ImageHandle>>,
    texts: Mutex<HashMap<GenerationTask, TextScript>>,
    failures: Mutex<HashMap<GenerationTask, RoomcraftError>>,
    gates: Mutex<HashMap<GenerationTask, Arc<Semaphore>>>,
}

impl StubClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_image(&self, task: GenerationTask, image: ImageHandle) {
        self.images.lock().unwrap().insert(task, image);
    }

    pub fn set_text(&self, task: GenerationTask, text: impl Into<String>) {
        let text = text.into();
        self.set_text_with(task, move |_| text.clone());
    }

    pub fn set_text_with(
        &self,
        task: GenerationTask,
        script: impl Fn(&GenerationRequest) -> String + Send + Sync + 'static,
    ) {
        self.texts.lock().unwrap().insert(task, Arc::new(script));
    }

    pub fn fail(&self, task: GenerationTask) {
        self.fail_with(task, RoomcraftError::generation(task.to_string(), "stub failure"));
    }

    pub fn fail_with(&self, task: GenerationTask, error: RoomcraftError) {
        self.failures.lock().unwrap().insert(task, error);
    }

    pub fn succeed(&self, task: GenerationTask) {
        self.failures.lock().unwrap().remove(&task);
    }

    /// Makes calls for `task` wait for a permit on the returned gate.
    pub fn gate(&self, task: GenerationTask) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().unwrap().insert(task, gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, task: GenerationTask) -> Vec<GenerationRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.task == task)
            .collect()
    }

    /// The image a task answers with when no override is set.
    pub fn default_image(task: GenerationTask) -> ImageHandle {
        ImageHandle::png(task.to_string().into_bytes())
    }

    async fn record(&self, request: &GenerationRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        let gate = self.gates.lock().unwrap().get(&request.task).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        match self.failures.lock().unwrap().get(&request.task) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GenerationClient for StubClient {
    async fn generate_image(&self, request: GenerationRequest) -> Result<ImageHandle> {
        self.record(&request).await?;
        Ok(self
            .images
            .lock()
            .unwrap()
            .get(&request.task)
            .cloned()
            .unwrap_or_else(|| Self::default_image(request.task)))
    }

    async fn generate_text(&self, request: GenerationRequest) -> Result<String> {
        self.record(&request).await?;
        let script = self.texts.lock().unwrap().get(&request.task).cloned();
        Ok(script.map(|s| s(&request)).unwrap_or_else(|| "[]".to_string()))
    }
}

/// A decodable PNG of the given size.
pub fn solid_png(width: u32, height: u32, shade: u8) -> ImageHandle {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade, shade, shade])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    ImageHandle::png(out.into_inner())
}

pub fn floorplan() -> ImageHandle {
    ImageHandle::png(b"floorplan".to_vec())
}

pub fn workflow(client: &Arc<StubClient>) -> RoomWorkflow {
    RoomWorkflow::new(GenerationOrchestrator::new(client.clone()))
}

/// Analyses a floorplan listing `names` and enters the design loop.
pub async fn designing_project(client: &Arc<StubClient>, names: &[&str]) -> (RoomWorkflow, Vec<String>) {
    let rooms: Vec<String> = names
        .iter()
        .map(|n| format!(r#"{{"name":"{n}","dimensions":"10' x 12'","details":"Window on north wall","structuralConstraints":"North window fixed"}}"#))
        .collect();
    client.set_text(
        GenerationTask::AnalyzeFloorplan,
        format!("```json\n[{}]\n```", rooms.join(",")),
    );

    let wf = workflow(client);
    let rooms = wf.analyze_floorplan(floorplan()).await.unwrap();
    let ids: Vec<String> = rooms.iter().map(|r| r.id.clone()).collect();
    wf.start_design(None).await.unwrap();
    (wf, ids)
}

/// Drives a room from `pending` to `reviewing` with an unapproved hero.
pub async fn reviewing_room(wf: &RoomWorkflow, room_id: &str) {
    wf.generate_sketch(room_id).await.unwrap();
    wf.approve_sketch(room_id).await.unwrap();
    wf.generate_hero(room_id, None).await.unwrap();
}

/// Polls until the room reaches `status`.
pub async fn wait_for_status(wf: &RoomWorkflow, room_id: &str, status: RoomStatus) {
    for _ in 0..200 {
        if wf.room(room_id).await.unwrap().status == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("room {room_id} never reached {status}");
}

/// Polls until `check` holds for the room.
pub async fn wait_until(
    wf: &RoomWorkflow,
    room_id: &str,
    check: impl Fn(&roomcraft_core::room::Room) -> bool,
) {
    for _ in 0..200 {
        if check(&wf.room(room_id).await.unwrap()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never held for room {room_id}");
}
