use std::path::Path;
use std::process::ExitCode;
use std::{env, fs};

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techc::compiler::compile_unit;
use techc::diag::Diagnostics;
use techc::scene::{build_scene, Builder};
use techc::trace::{DebugSession, DebugSettings};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut debugging = false;
    let mut file = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--debug" => debugging = true,
            other => file = Some(other.to_string()),
        }
    }

    let Some(file) = file else {
        eprintln!("usage: techc <file.tech> [--debug]");
        return ExitCode::FAILURE;
    };

    let text = match fs::read_to_string(&file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("ERROR: could not read '{file}': {e}");
            return ExitCode::FAILURE;
        }
    };
    let base_dir = Path::new(&file)
        .parent()
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let mut diag = Diagnostics::new();
    let blocks = match compile_unit(&text, &base_dir, &mut diag) {
        Ok(blocks) => blocks,
        Err(e) => {
            // A unit-level syntax error aborts the whole source unit.
            eprint!("{}", diag.text());
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut session = DebugSession::new(DebugSettings::default());
    let mut builder = Builder {
        debug: debugging.then_some(&mut session),
    };
    let scene = build_scene(&blocks, &mut builder, &mut diag);

    for (name, obj) in scene.iter() {
        println!("{} {}", obj.kind(), name);
    }
    info!(objects = scene.len(), "unit compiled");

    // Failed objects are absent from the scene; their messages end up
    // here, one line each, prefixed with their call context.
    eprint!("{}", diag.text());
    ExitCode::SUCCESS
}
