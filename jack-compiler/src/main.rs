//! Jack compiler - main entry point
//!
//! Compiles a `.jack` file, or every `.jack` file in a directory, into
//! sibling `.vm` and `.xml` outputs. OS support classes sitting in an
//! `OS` directory next to the executable are copied into the source
//! directory first, so the emitted `Math.*`/`String.*`/`Memory.*` calls
//! have something to link against downstream.
//!
//! # Usage
//! ```bash
//! jack-compiler <input.jack | directory>
//! ```

use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

use jack_compiler::{CompilationEngine, JackError};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.jack | directory>", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);

    if let Err(e) = copy_os_classes(input) {
        eprintln!("{}: failed to copy OS classes: {e}", args[1]);
        process::exit(1);
    }

    match run(input) {
        Ok(count) => println!("Compiled {count} class(es) from {}", args[1]),
        Err((context, e)) => {
            eprintln!("{context}: {e}");
            process::exit(1);
        }
    }
}

/// Copies any OS `.jack` classes shipped next to the executable into the
/// source directory, skipping files already present. No `OS` directory
/// means nothing to copy.
fn copy_os_classes(input: &Path) -> std::io::Result<()> {
    let Some(os_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("OS")))
        .filter(|dir| dir.is_dir())
    else {
        return Ok(());
    };

    let target_dir = if input.is_dir() {
        input.to_path_buf()
    } else {
        input.parent().unwrap_or_else(|| Path::new(".")).to_path_buf()
    };

    for entry in fs::read_dir(&os_dir)? {
        let entry = entry?;
        let to = target_dir.join(entry.file_name());
        if !to.exists() {
            fs::copy(entry.path(), &to)?;
        }
    }
    Ok(())
}

/// Enumerates the `.jack` inputs: the file itself, or every `.jack` in
/// the directory in sorted order.
fn jack_files(input: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(input)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jack"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no .jack files in directory",
        ));
    }
    Ok(files)
}

fn compile_file(path: &Path) -> Result<(), JackError> {
    let source = fs::read_to_string(path)?;

    let vm_file = File::create(path.with_extension("vm"))?;
    let xml_file = File::create(path.with_extension("xml"))?;

    CompilationEngine::new(
        &source,
        BufWriter::new(vm_file),
        BufWriter::new(xml_file),
    )?
    .compile()
}

fn run(input: &Path) -> Result<usize, (String, JackError)> {
    let files =
        jack_files(input).map_err(|e| (input.display().to_string(), JackError::Io(e)))?;

    for path in &files {
        compile_file(path).map_err(|e| (path.display().to_string(), e))?;
    }
    Ok(files.len())
}
