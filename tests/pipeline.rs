//! End-to-end pipeline scenarios driven by a fake codec that never touches
//! real image data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;

use webp_optimizer::{
    AnimatedEncodeParams, AssetManifest, BatchProgress, ManifestEntry, StaticEncodeParams,
    WebpCodec, WebpMetadata, WebpOptimizer, WebpOptions,
};

type TestResult<T> = Result<T>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Codec double: canned metadata per file name, configurable failure via a
/// `FAIL` marker in the input bytes, call counters and a concurrency
/// high-water mark.
#[derive(Default)]
struct FakeCodec {
    metadata: HashMap<String, WebpMetadata>,
    static_calls: AtomicUsize,
    animated_calls: AtomicUsize,
    animated_params: Mutex<Vec<AnimatedEncodeParams>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    encode_delay: Option<Duration>,
}

impl FakeCodec {
    fn with_metadata(mut self, file_name: &str, meta: WebpMetadata) -> Self {
        self.metadata.insert(file_name.to_string(), meta);
        self
    }

    fn with_encode_delay(mut self, delay: Duration) -> Self {
        self.encode_delay = Some(delay);
        self
    }

    fn encode(&self, input: &[u8]) -> webp_optimizer::OptimizerResult<Vec<u8>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.encode_delay {
            std::thread::sleep(delay);
        }
        let result = if input.windows(4).any(|w| w == b"FAIL") {
            Err(webp_optimizer::OptimizerError::codec("synthetic encode failure"))
        } else {
            Ok(encoded_output())
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl WebpCodec for FakeCodec {
    fn probe_metadata(&self, path: &Path) -> webp_optimizer::OptimizerResult<WebpMetadata> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(self
            .metadata
            .get(&name)
            .cloned()
            .unwrap_or(WebpMetadata { pages: Some(1), ..WebpMetadata::default() }))
    }

    fn encode_static(
        &self,
        input: &[u8],
        _params: &StaticEncodeParams,
    ) -> webp_optimizer::OptimizerResult<Vec<u8>> {
        self.static_calls.fetch_add(1, Ordering::SeqCst);
        self.encode(input)
    }

    fn encode_animated(
        &self,
        input: &[u8],
        params: &AnimatedEncodeParams,
    ) -> webp_optimizer::OptimizerResult<Vec<u8>> {
        self.animated_calls.fetch_add(1, Ordering::SeqCst);
        self.animated_params.lock().unwrap().push(params.clone());
        self.encode(input)
    }
}

/// A well-formed container of `total_size` bytes filled with `fill`.
fn webp_bytes(total_size: usize, fill: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(total_size.max(12));
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&[0, 0, 0, 0]);
    buf.extend_from_slice(b"WEBP");
    while buf.len() < total_size {
        buf.push(fill);
    }
    buf
}

/// A well-formed container whose payload trips the fake codec.
fn failing_webp_bytes(total_size: usize) -> Vec<u8> {
    let mut buf = webp_bytes(12, 0);
    while buf.len() < total_size {
        buf.extend_from_slice(b"FAIL");
    }
    buf
}

fn encoded_output() -> Vec<u8> {
    let mut buf = webp_bytes(12, 0);
    buf.extend_from_slice(b"optimized-output");
    buf
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> TestResult<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

fn scan_setup() -> TestResult<(TempDir, TempDir)> {
    Ok((TempDir::new()?, TempDir::new()?))
}

// ── Scenario A: size gate ─────────────────────────────────────────────────

#[tokio::test]
async fn small_asset_passes_through_without_encoding() -> TestResult<()> {
    init_tracing();
    let (src, out) = scan_setup()?;
    let original = webp_bytes(50 * 1024, 7);
    write_file(src.path(), "small.webp", &original)?;

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions { skip_if_smaller: Some(100 * 1024), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_directory(src.path(), out.path()).await?;

    assert_eq!(std::fs::read(out.path().join("small.webp"))?, original);
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 0);
    assert_eq!(codec.animated_calls.load(Ordering::SeqCst), 0);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.optimized, 0);
    Ok(())
}

// ── Scenario B: animated metadata passes through ──────────────────────────

#[tokio::test]
async fn animated_asset_keeps_loop_and_delays() -> TestResult<()> {
    init_tracing();
    let (src, out) = scan_setup()?;
    write_file(src.path(), "anim.webp", &webp_bytes(4096, 1))?;

    let delays: Vec<u32> = vec![40; 96];
    let codec = Arc::new(FakeCodec::default().with_metadata(
        "anim.webp",
        WebpMetadata {
            pages: Some(96),
            loop_count: Some(3),
            delay_ms: Some(delays.clone()),
            width: Some(800),
            page_height: Some(600),
            ..WebpMetadata::default()
        },
    ));
    let optimizer = WebpOptimizer::new(
        WebpOptions { max_width: Some(400), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_directory(src.path(), out.path()).await?;

    assert_eq!(summary.optimized, 1);
    assert_eq!(codec.animated_calls.load(Ordering::SeqCst), 1);
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 0);

    let params = codec.animated_params.lock().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].loop_count, 3);
    assert_eq!(params[0].delay_ms.as_deref(), Some(delays.as_slice()));
    // 800x600 fitted into width 400 -> 400x300, stacked over 96 pages
    assert_eq!(params[0].canvas, Some((400, 300 * 96)));
    Ok(())
}

#[tokio::test]
async fn animated_asset_encodes_statically_when_animation_disabled() -> TestResult<()> {
    let (src, out) = scan_setup()?;
    write_file(src.path(), "anim.webp", &webp_bytes(4096, 1))?;

    let codec = Arc::new(FakeCodec::default().with_metadata(
        "anim.webp",
        WebpMetadata { pages: Some(12), ..WebpMetadata::default() },
    ));
    let optimizer = WebpOptimizer::new(
        WebpOptions { optimize_animation: Some(false), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    optimizer.optimize_directory(src.path(), out.path()).await?;

    assert_eq!(codec.animated_calls.load(Ordering::SeqCst), 0);
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

// ── Scenario C: waves and progress ────────────────────────────────────────

#[tokio::test]
async fn twenty_five_assets_run_in_three_waves() -> TestResult<()> {
    init_tracing();
    let (src, out) = scan_setup()?;
    for i in 0..25 {
        write_file(src.path(), &format!("img-{i:02}.webp"), &webp_bytes(2048, i))?;
    }

    let codec = Arc::new(
        FakeCodec::default().with_encode_delay(Duration::from_millis(15)),
    );
    let progress: Arc<Mutex<Vec<BatchProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let progress_sink = Arc::clone(&progress);

    let optimizer = WebpOptimizer::new(
        WebpOptions { concurrent_images: Some(10), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?
    .on_progress(move |snapshot| progress_sink.lock().unwrap().push(snapshot));

    let summary = optimizer.optimize_directory(src.path(), out.path()).await?;
    assert_eq!(summary.total, 25);
    assert_eq!(summary.processed, 25);

    let events = progress.lock().unwrap();
    let counts: Vec<(usize, usize)> = events
        .iter()
        .map(|p| (p.completed_files, p.total_files))
        .collect();
    assert_eq!(counts, vec![(10, 25), (20, 25), (25, 25)]);
    for pair in events.windows(2) {
        assert!(pair[0].progress_percentage <= pair[1].progress_percentage);
    }

    // Wave-based execution bounds peak codec concurrency to the wave size.
    assert!(codec.peak_in_flight.load(Ordering::SeqCst) <= 10);
    Ok(())
}

// ── Scenario D: one failing asset never poisons the batch ─────────────────

#[tokio::test]
async fn codec_failure_falls_back_to_verbatim_copy() -> TestResult<()> {
    init_tracing();
    let (src, out) = scan_setup()?;
    let mut originals = Vec::new();
    for i in 0..10 {
        let bytes = if i == 6 {
            failing_webp_bytes(2048)
        } else {
            webp_bytes(2048, i as u8)
        };
        write_file(src.path(), &format!("img-{i}.webp"), &bytes)?;
        originals.push(bytes);
    }

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions::default(),
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_directory(src.path(), out.path()).await?;

    assert_eq!(summary.processed, 10);
    assert_eq!(summary.fallbacks, 1);
    assert_eq!(summary.optimized, 9);

    for i in 0..10 {
        let output = std::fs::read(out.path().join(format!("img-{i}.webp")))?;
        if i == 6 {
            // The failed asset keeps its original bytes
            assert_eq!(output, originals[i]);
        } else {
            assert_eq!(output, encoded_output());
        }
    }
    Ok(())
}

// ── Scan-mode gates ───────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_container_falls_back_without_encoding() -> TestResult<()> {
    let (src, out) = scan_setup()?;
    let not_webp = vec![0u8; 256];
    write_file(src.path(), "broken.webp", &not_webp)?;

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions::default(),
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_directory(src.path(), out.path()).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.fallbacks, 1);
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read(out.path().join("broken.webp"))?, not_webp);
    Ok(())
}

#[tokio::test]
async fn oversized_scan_asset_is_skipped_with_no_output() -> TestResult<()> {
    let (src, out) = scan_setup()?;
    write_file(src.path(), "huge.webp", &webp_bytes(10 * 1024, 2))?;

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions { max_file_size: Some(1024), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_directory(src.path(), out.path()).await?;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 0);
    assert!(!out.path().join("huge.webp").exists());
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn encode_timeout_falls_back() -> TestResult<()> {
    let (src, out) = scan_setup()?;
    let original = webp_bytes(2048, 3);
    write_file(src.path(), "slow.webp", &original)?;

    let codec = Arc::new(
        FakeCodec::default().with_encode_delay(Duration::from_secs(2)),
    );
    let optimizer = WebpOptimizer::new(
        WebpOptions { codec_timeout_secs: Some(1), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_directory(src.path(), out.path()).await?;

    assert_eq!(summary.fallbacks, 1);
    assert_eq!(std::fs::read(out.path().join("slow.webp"))?, original);
    Ok(())
}

// ── Manifest mode ─────────────────────────────────────────────────────────

fn manifest_for(path: &Path, file_name: &str, size: u64) -> AssetManifest {
    let mut manifest = AssetManifest::new();
    manifest.insert(
        file_name.to_string(),
        ManifestEntry {
            source: Some(path.to_string_lossy().to_string()),
            bytes: None,
            size,
            animated: None,
        },
    );
    manifest
}

#[tokio::test]
async fn unchanged_manifest_asset_hits_the_cache_on_the_second_pass() -> TestResult<()> {
    init_tracing();
    let (src, out) = scan_setup()?;
    let source = write_file(src.path(), "logo.webp", &webp_bytes(4096, 4))?;
    let manifest = manifest_for(&source, "logo.webp", 4096);

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions::default(),
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;

    let first = optimizer.optimize_manifest(&manifest, out.path()).await?;
    assert_eq!(first.optimized, 1);
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 1);

    // Source untouched: the second pass is a pass-through copy, no encode.
    let second = optimizer.optimize_manifest(&manifest, out.path()).await?;
    assert_eq!(second.processed, 1);
    assert_eq!(second.optimized, 0);
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read(out.path().join("logo.webp"))?, webp_bytes(4096, 4));
    Ok(())
}

#[tokio::test]
async fn modified_manifest_asset_invalidates_the_cache() -> TestResult<()> {
    let (src, out) = scan_setup()?;
    let source = write_file(src.path(), "logo.webp", &webp_bytes(4096, 4))?;
    let manifest = manifest_for(&source, "logo.webp", 4096);

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions::default(),
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    optimizer.optimize_manifest(&manifest, out.path()).await?;

    // A size change alone must invalidate the entry.
    std::fs::write(&source, webp_bytes(5000, 4))?;
    optimizer.optimize_manifest(&manifest, out.path()).await?;
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn manifest_mode_has_no_upper_bound_precheck() -> TestResult<()> {
    let (src, out) = scan_setup()?;
    let source = write_file(src.path(), "big.webp", &webp_bytes(64 * 1024, 5))?;
    let manifest = manifest_for(&source, "big.webp", 64 * 1024);

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions { max_file_size: Some(1024), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_manifest(&manifest, out.path()).await?;

    // Encoded despite exceeding the ceiling; the oversize check is post-encode only.
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.optimized, 1);
    Ok(())
}

// Bundler-emitted entries resolve to their own location under the output
// root, so every pass-through and fallback copy is source == destination.
// Those must leave the file untouched, never truncate it.

#[tokio::test]
async fn aliased_manifest_entry_survives_pass_through() -> TestResult<()> {
    init_tracing();
    let out = TempDir::new()?;
    let original = webp_bytes(2048, 8);
    std::fs::create_dir_all(out.path().join("assets"))?;
    let emitted = write_file(&out.path().join("assets"), "logo-abc123.webp", &original)?;

    let mut manifest = AssetManifest::new();
    manifest.insert(
        "assets/logo-abc123.webp".to_string(),
        ManifestEntry { source: None, bytes: None, size: 2048, animated: None },
    );

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions { skip_if_smaller: Some(100 * 1024), ..WebpOptions::default() },
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_manifest(&manifest, out.path()).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.fallbacks, 0);
    assert_eq!(codec.static_calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read(&emitted)?, original);
    Ok(())
}

#[tokio::test]
async fn aliased_manifest_entry_survives_codec_failure() -> TestResult<()> {
    init_tracing();
    let out = TempDir::new()?;
    let original = failing_webp_bytes(4096);
    std::fs::create_dir_all(out.path().join("assets"))?;
    let emitted = write_file(&out.path().join("assets"), "hero-def456.webp", &original)?;

    let mut manifest = AssetManifest::new();
    manifest.insert(
        "assets/hero-def456.webp".to_string(),
        ManifestEntry { source: None, bytes: None, size: 4096, animated: None },
    );

    let codec = Arc::new(FakeCodec::default());
    let optimizer = WebpOptimizer::new(
        WebpOptions::default(),
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    let summary = optimizer.optimize_manifest(&manifest, out.path()).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.fallbacks, 1);
    assert_eq!(std::fs::read(&emitted)?, original);
    Ok(())
}

#[tokio::test]
async fn manifest_asset_with_declared_animation_skips_detection() -> TestResult<()> {
    let (src, out) = scan_setup()?;
    let source = write_file(src.path(), "anim.webp", &webp_bytes(4096, 6))?;
    let mut manifest = AssetManifest::new();
    manifest.insert(
        "anim.webp".to_string(),
        ManifestEntry {
            source: Some(source.to_string_lossy().to_string()),
            bytes: None,
            size: 4096,
            animated: Some(true),
        },
    );

    let codec = Arc::new(FakeCodec::default().with_metadata(
        "anim.webp",
        WebpMetadata { pages: Some(8), loop_count: Some(0), ..WebpMetadata::default() },
    ));
    let optimizer = WebpOptimizer::new(
        WebpOptions::default(),
        Arc::clone(&codec) as Arc<dyn WebpCodec>,
    )?;
    optimizer.optimize_manifest(&manifest, out.path()).await?;

    assert_eq!(codec.animated_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

// ── Construction and discovery edges ──────────────────────────────────────

#[tokio::test]
async fn invalid_configuration_fails_before_any_io() {
    let codec: Arc<dyn WebpCodec> = Arc::new(FakeCodec::default());
    let err = WebpOptimizer::new(
        WebpOptions { quality: Some(0), ..WebpOptions::default() },
        codec,
    )
    .err()
    .expect("out-of-range quality must be rejected");
    assert!(err.to_string().contains("quality"));
}

#[tokio::test]
async fn missing_scan_root_yields_an_empty_summary() -> TestResult<()> {
    let out = TempDir::new()?;
    let progress: Arc<Mutex<Vec<BatchProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let progress_sink = Arc::clone(&progress);

    let optimizer = WebpOptimizer::new(
        WebpOptions::default(),
        Arc::new(FakeCodec::default()) as Arc<dyn WebpCodec>,
    )?
    .on_progress(move |snapshot| progress_sink.lock().unwrap().push(snapshot));

    let summary = optimizer
        .optimize_directory(Path::new("/definitely/not/here"), out.path())
        .await?;
    assert_eq!(summary.total, 0);
    assert_eq!(summary.processed, 0);
    assert!(progress.lock().unwrap().is_empty());
    Ok(())
}
