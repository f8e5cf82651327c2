#![allow(dead_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use tempfile::{TempDir, tempdir};

/// Small lens catalogue using the default (Japanese) column names.
pub const LENS_CSV: &str = "\
レンズ名,メーカー,マウント,焦点距離,開放F値,画像URL
RF50mm F1.8 STM,Canon,RF,50mm,F1.8,https://example.com/rf50.png
RF24-105mm F4 L,Canon,RF,24-105mm,F4,
Z 24mm f/1.8 S,Nikon,Z,24mm,f/1.8,
TTArtisan 8mm,TTArtisan,Z,8mm,F2.8,
";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Serves exactly one HTTP response on a loopback port. Returns the URL to
/// request and a handle that yields the request line once served.
pub fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("read request line");
        loop {
            let mut line = String::new();
            let read = reader.read_line(&mut line).expect("read header");
            if read == 0 || line == "\r\n" {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/csv; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush response");
        request_line.trim_end().to_string()
    });
    (format!("http://{addr}/pub?output=csv"), handle)
}
