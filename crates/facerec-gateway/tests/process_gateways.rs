//! Subprocess gateways driven by small shell scripts standing in for the
//! Python programs.
#![cfg(unix)]

use std::path::Path;

use facerec_core::UserId;
use facerec_gateway::{
    FeatureExtractor, GalleryMatcher, GalleryWriter, GatewayError, ProcessExtractor,
    ProcessGalleryWriter, ProcessMatcher, ScriptCommand,
};
use tempfile::TempDir;

fn sh(script: &str) -> ScriptCommand {
    ScriptCommand::new("sh").arg("-c").arg(script).arg("fake-program")
}

#[tokio::test]
async fn extractor_receives_image_path_and_parses_vector() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("upload-1.jpeg");
    std::fs::write(&image, b"[0.5, 1.5, -2.0]").unwrap();

    // The fake extractor echoes the "image" contents, which hold the vector.
    let extractor = ProcessExtractor::new(sh("cat \"$1\""));
    let vector = extractor.extract(&image).await.unwrap();
    assert_eq!(vector.as_slice(), &[0.5, 1.5, -2.0]);
}

#[tokio::test]
async fn extractor_failure_includes_program_output() {
    let extractor = ProcessExtractor::new(sh("echo 'Traceback: no module named face_recognition' >&2; exit 1"));
    let err = extractor.extract(Path::new("/tmp/missing.jpeg")).await.unwrap_err();
    match err {
        GatewayError::ExternalProcess { output, .. } => {
            assert!(output.contains("face_recognition"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn extractor_with_no_face_is_malformed_output() {
    // The reference extractor prints nothing and exits 0 when no face is found.
    let extractor = ProcessExtractor::new(sh("exit 0"));
    let err = extractor.extract(Path::new("/tmp/blank.jpeg")).await.unwrap_err();
    assert!(matches!(err, GatewayError::MalformedOutput { .. }));
}

#[tokio::test]
async fn matcher_receives_probe_then_gallery() {
    let matcher = ProcessMatcher::new(sh(
        "[ \"$1\" = /tmp/probe.jpeg ] && [ \"$2\" = /tmp/gallery.npy ] && echo 7",
    ));
    let found = matcher
        .find_match(Path::new("/tmp/probe.jpeg"), Path::new("/tmp/gallery.npy"))
        .await
        .unwrap();
    assert_eq!(found, Some(UserId::new(7)));
}

#[tokio::test]
async fn matcher_no_match_outputs() {
    for script in ["echo", "echo None", "printf ''"] {
        let matcher = ProcessMatcher::new(sh(script));
        let found = matcher
            .find_match(Path::new("/tmp/p.jpeg"), Path::new("/tmp/g.npy"))
            .await
            .unwrap();
        assert_eq!(found, None, "script {script:?}");
    }
}

#[tokio::test]
async fn matcher_garbage_output_is_malformed() {
    let matcher = ProcessMatcher::new(sh("echo 'user seven'"));
    let err = matcher
        .find_match(Path::new("/tmp/p.jpeg"), Path::new("/tmp/g.npy"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MalformedOutput { .. }));
}

#[tokio::test]
async fn writer_receives_records_then_destination() {
    let dir = TempDir::new().unwrap();
    let records = dir.path().join("embeddings-1.json");
    let destination = dir.path().join("gallery.npy");
    std::fs::write(&records, b"[]").unwrap();

    let writer = ProcessGalleryWriter::new(sh("cp \"$1\" \"$2\""));
    writer.write_gallery(&records, &destination).await.unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), b"[]");
}

#[tokio::test]
async fn writer_failure_is_external_process_error() {
    let writer = ProcessGalleryWriter::new(sh("exit 2"));
    let err = writer
        .write_gallery(Path::new("/tmp/r.json"), Path::new("/tmp/g.npy"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::ExternalProcess { .. }));
}
