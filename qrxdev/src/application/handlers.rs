use std::path::{Path, PathBuf};

use crate::presentation::cli::{DuplicatesArg, TotalsArg};
use qrx_core::diagnostics::format_ranges;
use qrx_core::error::Result;
use qrx_core::{
    Capabilities, DecodeOptions, DecodePolicy, Decoder, EcLevel, EncodeOptions, Encoder, inspect,
};

fn require_dir(p: &Path) -> Result<()> {
    if p.is_dir() {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", p.display()),
        )
        .into())
    }
}

pub fn handle_encode(
    source: PathBuf,
    output: PathBuf,
    exclude: Vec<String>,
    chunk_size: usize,
    error_correction: EcLevel,
    deterministic: bool,
) -> Result<()> {
    let caps = Capabilities::detect()?;
    require_dir(&source)?;
    let opts = EncodeOptions {
        chunk_size,
        ec_level: error_correction,
        exclude,
        deterministic,
    };
    let report = Encoder::new(caps.renderer, opts)?.encode_dir(&source, &output)?;
    eprintln!(
        "encode: {} files -> {} symbols in {} ({} failed)",
        report.stats.files,
        report.stats.symbols,
        output.display(),
        report.stats.failed_files
    );
    Ok(())
}

pub fn handle_decode(
    input: PathBuf,
    output: PathBuf,
    duplicates: DuplicatesArg,
    totals: TotalsArg,
    strict: bool,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let caps = Capabilities::detect()?;
    require_dir(&input)?;
    let policy = if strict {
        DecodePolicy::strict()
    } else {
        DecodePolicy {
            duplicates: duplicates.into(),
            totals: totals.into(),
        }
    };
    let report = Decoder::new(caps.scanner, DecodeOptions { policy }).decode_dir(&input, &output)?;

    if let Some(p) = report_path {
        std::fs::write(&p, serde_json::to_vec_pretty(&report)?)?;
    }
    for f in &report.files {
        let flag = if f.complete { "" } else { "  (incomplete)" };
        eprintln!("decode: {}  {} bytes  blake3={}{}", f.path, f.size, f.blake3, flag);
    }
    eprintln!(
        "decode: {} files written, {} abandoned, {} diagnostics",
        report.stats.files_written,
        report.stats.files_abandoned,
        report.diagnostics.len()
    );
    Ok(())
}

pub fn handle_inspect(input: PathBuf, json: bool) -> Result<()> {
    let caps = Capabilities::detect()?;
    require_dir(&input)?;
    let report = inspect(caps.scanner.as_ref(), &input, DecodePolicy::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for p in &report.paths {
        let total = p.totals.iter().max().copied().unwrap_or(0);
        let state = if p.is_complete() { "ok" } else { "INCOMPLETE" };
        println!(
            "{:<10} {:>5}/{:<5} dup={:<3} {}",
            state,
            p.present.len(),
            total,
            p.duplicates,
            p.path
        );
        if p.totals.len() > 1 {
            println!("           totals disagree: {:?}", p.totals);
        }
        if !p.missing.is_empty() {
            println!("           missing: {}", format_ranges(&p.missing));
        }
    }
    for d in &report.diagnostics {
        println!("! {d}");
    }
    eprintln!(
        "inspect: {} images, {} payloads, {} paths",
        report.images,
        report.payloads,
        report.paths.len()
    );
    Ok(())
}
