//! Thin stand-in for the extraction CLI: reads one D88 path from argv, runs
//! the pipeline, and writes artifacts into a sibling `<stem> [FAT8 Contents]`
//! directory. Argument parsing, directory uniquification, and the per-disk
//! `[Disk NN]` / `[Error Count NN]` suffix policy are the real CLI's job;
//! this demonstrates the `ArtifactSink` seam at the thinnest level that
//! still exercises it.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fat8img::pipeline::{self, ArtifactSink, PipelineOptions};

struct DirSink {
    root: PathBuf,
}

impl ArtifactSink for DirSink {
    fn write_file(&mut self, name: &str, body: &[u8]) -> io::Result<()> {
        fs::write(self.root.join(name), body)
    }

    fn log(&mut self, line: &str) {
        println!("{}", line);
    }
}

fn main() -> io::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).expect("usage: fat8img-extract <path.d88>");
    let bytes = fs::read(&path)?;

    let stem = Path::new(&path).file_stem().and_then(|s| s.to_str()).unwrap_or("disk");
    let root = PathBuf::from(format!("{} [FAT8 Contents]", stem));
    fs::create_dir_all(&root)?;

    let mut sink = DirSink { root };
    let report = pipeline::run(&bytes, &PipelineOptions::default(), &mut sink);

    println!("processed {} image(s), {} error(s)", report.images_processed, report.errors.len());
    Ok(())
}
