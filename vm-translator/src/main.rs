//! VM translator - main entry point
//!
//! Translates a single `.vm` file or a directory of them into one Hack
//! assembly file. Directory runs get the bootstrap prologue (SP=256,
//! `call Sys.init 0`); single-file runs do not.
//!
//! # Usage
//! ```bash
//! vm-translator <input.vm | directory>
//! ```

use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;

use vm_translator::{CodeWriter, Parser, VmError, translate_file};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.vm | directory>", args[0]);
        process::exit(1);
    }

    match run(Path::new(&args[1])) {
        Ok(output) => println!("Translation complete: {} -> {}", args[1], output.display()),
        Err((context, e)) => {
            eprintln!("{context}: {e}");
            process::exit(1);
        }
    }
}

/// Enumerates the input files, derives the output path, and decides
/// whether the run needs the bootstrap prologue.
fn plan_run(input: &Path) -> std::io::Result<(Vec<PathBuf>, PathBuf, bool)> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "vm"))
            .collect();
        // Sorted so a directory run always produces the same output.
        files.sort();

        if files.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no .vm files in directory",
            ));
        }

        let dir_name = input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("out")
            .to_string();
        let output = input.join(format!("{dir_name}.asm"));
        Ok((files, output, true))
    } else {
        Ok((vec![input.to_path_buf()], input.with_extension("asm"), false))
    }
}

fn run(input: &Path) -> Result<PathBuf, (String, VmError)> {
    let input_context = || input.display().to_string();

    let (files, output, bootstrap) =
        plan_run(input).map_err(|e| (input_context(), VmError::Io(e)))?;

    let file = File::create(&output).map_err(|e| (input_context(), VmError::Io(e)))?;
    let mut writer = CodeWriter::new(BufWriter::with_capacity(8192, file));

    if bootstrap {
        writer
            .write_init()
            .map_err(|e| (input_context(), VmError::Io(e)))?;
    }

    for path in &files {
        let file_context = || path.display().to_string();
        let mut parser = Parser::new(path).map_err(|e| (file_context(), e))?;
        writer.set_file_name(path);
        translate_file(&mut parser, &mut writer).map_err(|e| (file_context(), e))?;
    }

    writer
        .flush()
        .map_err(|e| (input_context(), VmError::Io(e)))?;
    Ok(output)
}
