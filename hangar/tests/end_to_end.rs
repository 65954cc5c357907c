//! Full pipeline tests: a local HTTP server serves a real release
//! archive, and the manager installs from it, launches projects against
//! it, and cleans up after failures.

use std::io::{Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use hangar::catalog::{Catalog, EngineRelease};
use hangar::manager::{EngineManager, ManagerError, PipelineProgressCallback};
use hangar::platform::EXECUTABLE_EXTENSION;
use hangar::project;
use hangar::store::{self, InstallationStore};

fn drain_request(stream: &mut TcpStream) {
    let mut buf = [0u8; 1024];
    let mut head = Vec::new();
    loop {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            return;
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            return;
        }
    }
}

fn serve(responses: Vec<Vec<u8>>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            drain_request(&mut stream);
            stream.write_all(&response).ok();
            stream.flush().ok();
        }
    });

    (format!("http://{addr}"), handle)
}

fn ok_response(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// Executable name a real release build carries on this platform.
fn release_executable() -> String {
    format!("Godot_v1.0-stable.{EXECUTABLE_EXTENSION}")
}

/// Build a release archive in memory: one executable named like a real
/// engine build, plus padding to make the download span many chunks.
fn release_zip(executable_name: &str, padding: usize) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let exe_options = SimpleFileOptions::default().unix_permissions(0o755);
    zip.start_file(executable_name, exe_options).unwrap();
    zip.write_all(b"#!/bin/sh\nexit 0\n").unwrap();

    if padding > 0 {
        // Stored, not deflated, so the archive stays large on the wire.
        let pad_options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("padding.dat", pad_options).unwrap();
        zip.write_all(&vec![0x42u8; padding]).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Manager over a single-release catalog pointing at `base_url`.
fn test_manager(temp: &Path, base_url: &str) -> EngineManager {
    let catalog = Catalog::from_releases(vec![EngineRelease {
        version: "1.0".to_string(),
        size: "1 MB".to_string(),
        download_url: format!("{base_url}/engine.zip"),
    }]);

    let mut store = InstallationStore::empty(temp.join("store.txt"));
    store.set_default_engine_dir(temp.join("engines")).unwrap();
    store.set_default_project_dir(temp.join("projects")).unwrap();

    EngineManager::new(catalog, store::shared(store))
}

#[test]
fn test_install_pipeline_end_to_end() {
    let archive = release_zip(&release_executable(), 0);
    let (base, server) = serve(vec![ok_response(&archive)]);

    let temp = tempfile::TempDir::new().unwrap();
    let manager = test_manager(temp.path(), &base);

    let handle = manager.install_in_background("1.0", None);
    let executable = handle.wait().unwrap();

    // Binary extracted into the version directory.
    let dest_dir = temp.path().join("engines").join("1.0");
    assert_eq!(executable, dest_dir.join(release_executable()));
    assert!(executable.is_file());

    // Temp archive cleaned up.
    assert!(!temp
        .path()
        .join("engines")
        .join("godot-1.0.zip.part")
        .exists());

    // Store marked and persisted.
    assert!(manager.store().lock().is_installed("1.0"));
    let reloaded = InstallationStore::load(temp.path().join("store.txt")).unwrap();
    assert_eq!(reloaded.installed_path("1.0"), Some(executable.as_path()));

    // Listing reflects the install.
    let listings = manager.engines();
    assert!(listings[0].installed);

    server.join().unwrap();
}

#[cfg(unix)]
#[test]
fn test_installed_engine_opens_a_project() {
    let archive = release_zip(&release_executable(), 0);
    let (base, server) = serve(vec![ok_response(&archive)]);

    let temp = tempfile::TempDir::new().unwrap();
    let manager = test_manager(temp.path(), &base);
    manager
        .install("1.0", &CancellationToken::new(), None)
        .unwrap();

    let root = temp.path().join("projects").join("Demo");
    let created = project::scaffold("Demo", &root, "1.0").unwrap();
    let index = manager.store().lock().add_project(created).unwrap();

    let before = manager.store().lock().project(index).unwrap().last_opened;
    manager.open_project(index).unwrap();
    let after = manager.store().lock().project(index).unwrap().last_opened;

    assert!(after >= before);
    server.join().unwrap();
}

#[test]
fn test_cancelled_install_leaves_nothing_behind() {
    // Large padding so the download takes many chunks to finish.
    let archive = release_zip(&release_executable(), 512 * 1024);
    let (base, server) = serve(vec![ok_response(&archive)]);

    let temp = tempfile::TempDir::new().unwrap();
    let manager = test_manager(temp.path(), &base);

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    let progress: PipelineProgressCallback = Box::new(move |_phase, _fraction| {
        canceller.cancel();
    });

    let result = manager.install("1.0", &cancel, Some(progress));

    assert!(matches!(result, Err(ManagerError::Cancelled)));
    assert!(!manager.store().lock().is_installed("1.0"));
    assert!(!temp.path().join("engines").join("1.0").exists());
    assert!(!temp
        .path()
        .join("engines")
        .join("godot-1.0.zip.part")
        .exists());

    server.join().unwrap();
}

#[test]
fn test_failed_download_releases_the_version_for_retry() {
    let not_found =
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec();
    let (base, server) = serve(vec![not_found.clone(), not_found]);

    let temp = tempfile::TempDir::new().unwrap();
    let manager = test_manager(temp.path(), &base);

    let first = manager.install("1.0", &CancellationToken::new(), None);
    assert!(matches!(first, Err(ManagerError::Network { .. })));

    // The failure released the in-flight claim, so the retry reaches
    // the network again instead of being rejected as in progress.
    let second = manager.install("1.0", &CancellationToken::new(), None);
    assert!(matches!(second, Err(ManagerError::Network { .. })));

    assert!(!manager.store().lock().is_installed("1.0"));
    server.join().unwrap();
}

#[test]
fn test_archive_without_executable_is_not_an_install() {
    // Valid zip, but nothing launchable inside.
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("README.md", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"docs only").unwrap();
    let archive = zip.finish().unwrap().into_inner();

    let (base, server) = serve(vec![ok_response(&archive)]);
    let temp = tempfile::TempDir::new().unwrap();
    let manager = test_manager(temp.path(), &base);

    let result = manager.install("1.0", &CancellationToken::new(), None);

    assert!(matches!(result, Err(ManagerError::ExecutableNotFound { .. })));
    assert!(!manager.store().lock().is_installed("1.0"));
    assert!(!temp.path().join("engines").join("1.0").exists());

    // The download survives the failed install, so a retry or a manual
    // inspection does not have to fetch it again.
    assert!(temp
        .path()
        .join("engines")
        .join("godot-1.0.zip.part")
        .is_file());

    server.join().unwrap();
}

#[test]
fn test_corrupt_archive_cleans_destination_but_keeps_download() {
    let (base, server) = serve(vec![ok_response(b"this is not a zip archive")]);

    let temp = tempfile::TempDir::new().unwrap();
    let manager = test_manager(temp.path(), &base);

    let result = manager.install("1.0", &CancellationToken::new(), None);

    assert!(matches!(result, Err(ManagerError::ArchiveCorrupt { .. })));
    assert!(!manager.store().lock().is_installed("1.0"));
    assert!(!temp.path().join("engines").join("1.0").exists());
    assert!(temp
        .path()
        .join("engines")
        .join("godot-1.0.zip.part")
        .is_file());
    server.join().unwrap();
}
