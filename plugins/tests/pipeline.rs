use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use tagflow_core::api::{
    AnnotationRequest, BatchEngine, Endpoint, EndpointKind, LiveConfig, Payload, RemoteClient,
    RemoteError, RunConfig, Task, TaskBoard, TaskStatus,
};
use tagflow_plugins::dataset::{export_dataset, ingest_dir, ingest_path};
use tagflow_plugins::executor::{ImagePreprocessorPlugin, OpenAiClient};

const LABEL: &str = "lighthouse on a rocky coast, overcast sky, waves";

#[derive(Default)]
struct Capture {
    payloads: Mutex<Vec<Payload>>,
}

#[async_trait]
impl RemoteClient for Capture {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Openai
    }

    async fn send(
        &self,
        request: AnnotationRequest<'_>,
        _cancel: &CancellationToken,
    ) -> Result<String, RemoteError> {
        self.payloads.lock().unwrap().push(request.payload.clone());
        Ok(LABEL.to_string())
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn config(endpoint: Endpoint) -> RunConfig {
    let mut cfg = RunConfig {
        endpoints: vec![endpoint],
        ..Default::default()
    };
    cfg.retry.interval_ms = 0;
    cfg
}

#[tokio::test]
async fn under_budget_image_is_sent_byte_identical() {
    let original = png(64, 48);
    let client = Arc::new(Capture::default());
    let engine = BatchEngine::builder(LiveConfig::new(config(Endpoint::new(
        "e1",
        EndpointKind::Openai,
        "k",
        "m",
    ))))
    .client(client.clone())
    .preprocessor(Arc::new(ImagePreprocessorPlugin::new()))
    .build();
    let board = Arc::new(TaskBoard::new(vec![Task::new("t1", "a.png", original.clone())]));

    engine.run(board.clone()).await.unwrap();

    let sent = client.payloads.lock().unwrap().clone();
    assert_eq!(sent, vec![Payload::encode(&original, "image/png")]);
    assert_eq!(board.get("t1").unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn oversized_image_is_shrunk_before_sending() {
    let original = png(300, 100);
    let client = Arc::new(Capture::default());
    let mut cfg = config(Endpoint::new("e1", EndpointKind::Openai, "k", "m"));
    cfg.compression.max_size_mb = 0.0;
    cfg.compression.max_dimension = 60;
    let engine = BatchEngine::builder(LiveConfig::new(cfg))
        .client(client.clone())
        .preprocessor(Arc::new(ImagePreprocessorPlugin::new()))
        .build();

    engine
        .run(Arc::new(TaskBoard::new(vec![Task::new("t1", "wide.png", original)])))
        .await
        .unwrap();

    let sent = client.payloads.lock().unwrap()[0].clone();
    assert_eq!(sent.mime_type, "image/jpeg");
    let bytes = base64_decode(&sent.base64);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (60, 20));
}

fn base64_decode(s: &str) -> Vec<u8> {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.decode(s).unwrap()
}

#[tokio::test]
async fn directory_round_trip_through_openai_endpoint() {
    let input = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("one.png"), png(8, 8)).unwrap();
    std::fs::write(input.path().join("two.png"), png(8, 8)).unwrap();
    std::fs::write(input.path().join("two.txt"), "already labeled, keep me").unwrap();

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(format!(r#"{{"choices":[{{"message":{{"content":"{LABEL}"}}}}]}}"#))
        .expect(1)
        .create_async()
        .await;

    let mut endpoint = Endpoint::new("e1", EndpointKind::Openai, "sk-test", "gpt-4o-mini");
    endpoint.base_url = Some(server.url());
    let engine = BatchEngine::builder(LiveConfig::new(config(endpoint)))
        .client(Arc::new(OpenAiClient::new(reqwest::Client::new())))
        .preprocessor(Arc::new(ImagePreprocessorPlugin::new()))
        .build();

    let board = Arc::new(TaskBoard::new(ingest_dir(input.path(), false).await.unwrap()));
    let summary = engine.run(board.clone()).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.completed, 1);
    mock.assert_async().await;

    let output = tempfile::tempdir().unwrap();
    let report = export_dataset(&board.snapshot(), output.path()).await.unwrap();
    assert_eq!(report.labeled, 2);
    assert_eq!(
        std::fs::read_to_string(output.path().join("one.txt")).unwrap(),
        LABEL
    );
    assert_eq!(
        std::fs::read_to_string(output.path().join("two.txt")).unwrap(),
        "already labeled, keep me"
    );
}

#[tokio::test]
async fn archive_round_trip_through_openai_endpoint() {
    let input = tempfile::tempdir().unwrap();
    let archive = input.path().join("batch.zip");
    {
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
        zip.start_file("set/one.png", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&png(8, 8)).unwrap();
        zip.start_file("set/two.png", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&png(8, 8)).unwrap();
        zip.start_file("set/two.caption", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"already labeled, keep me").unwrap();
        zip.finish().unwrap();
    }

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(format!(r#"{{"choices":[{{"message":{{"content":"{LABEL}"}}}}]}}"#))
        .expect(1)
        .create_async()
        .await;

    let mut endpoint = Endpoint::new("e1", EndpointKind::Openai, "sk-test", "gpt-4o-mini");
    endpoint.base_url = Some(server.url());
    let engine = BatchEngine::builder(LiveConfig::new(config(endpoint)))
        .client(Arc::new(OpenAiClient::new(reqwest::Client::new())))
        .build();

    let board = Arc::new(TaskBoard::new(ingest_path(&archive, false).await.unwrap()));
    assert_eq!(board.len(), 2);
    let summary = engine.run(board.clone()).await.unwrap();
    assert_eq!(summary.completed, 1);
    mock.assert_async().await;

    let out = input.path().join("export").join("dataset.zip");
    let report = export_dataset(&board.snapshot(), &out).await.unwrap();
    assert_eq!((report.images, report.labeled), (2, 2));

    let mut zip = zip::ZipArchive::new(std::fs::File::open(&out).unwrap()).unwrap();
    let mut caption = String::new();
    zip.by_name("set/one.txt")
        .unwrap()
        .read_to_string(&mut caption)
        .unwrap();
    assert_eq!(caption, LABEL);
    assert!(zip.by_name("set/two.png").is_ok());
}
