//! Thin entry point: parse args, validate into a `Config`, set up logging,
//! dispatch to the library, and translate errors into the original's
//! exit-code discipline (0 on success, 1 on any failure).

use cfbf_kit::cli::{Action, Args, Config};
use cfbf_kit::directory::{DirEntry, DirVisitor, ObjectType, Step};
use cfbf_kit::encoding;
use cfbf_kit::{Cfbf, Error, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, Write};

fn setup_logging(level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Picks the output sink: `-o -` or no `-o` means stdout, except for `-w`
/// which defaults to stderr, matching the original's behaviour.
fn open_output(config: &Config) -> Result<Box<dyn Write>> {
    match config.output.as_deref() {
        None | Some("-") => {
            if matches!(config.action, Action::Walk) {
                Ok(Box::new(io::stderr()))
            } else {
                Ok(Box::new(io::stdout()))
            }
        }
        Some(path) => Ok(Box::new(File::create(path)?)),
    }
}

struct TreePrinter<'a> {
    out: &'a mut dyn Write,
    mini_stream_cutoff: u64,
}

impl<'a> DirVisitor for TreePrinter<'a> {
    fn visit(&mut self, entry: &DirEntry, _parent: Option<u32>, depth: u32) -> Result<Step> {
        let type_str = match entry.object_type() {
            Some(ObjectType::Storage) => "STORAGE",
            Some(ObjectType::Stream) => "STREAM",
            Some(ObjectType::Root) => "ROOT",
            None => "?",
        };
        let mini_marker = if entry.stored_in_mini(self.mini_stream_cutoff) {
            "m"
        } else {
            " "
        };
        writeln!(
            self.out,
            "{:<8} {:>10}{} {:>10}    {}{}",
            type_str,
            entry.start_sector.0,
            mini_marker,
            entry.stream_size,
            "    ".repeat(depth as usize),
            entry.name
        )?;
        Ok(Step::Continue)
    }
}

fn print_header(cfbf: &Cfbf, out: &mut dyn Write) -> Result<()> {
    let header = cfbf.header();
    writeln!(out, "DllVersion, MinorVersion:     {}, {}", header.major_version, header.minor_version)?;
    writeln!(out, "Main FAT sector size:         2^{} ({})", header.sector_shift, header.sector_size())?;
    writeln!(out, "Mini-stream sector size:      2^{} ({})", header.mini_sector_shift, header.mini_sector_size())?;
    writeln!(out, "FAT chain sector count:       {}", header.csect_fat)?;
    if let Some(csect_dir) = header.directory_sector_count() {
        writeln!(out, "Directory chain sector count: {}", csect_dir)?;
    }
    writeln!(out, "Directory chain first sector: {}", header.sect_dir_start)?;
    writeln!(out, "Max file size in mini-stream: {}", header.mini_stream_cutoff)?;
    writeln!(out, "MiniFAT first sector, count:  {}, {}", header.sect_mini_fat_start, header.csect_mini_fat)?;
    writeln!(out, "DIFAT first sector, count:    {}, {}", header.sect_dif_start, header.csect_dif)?;
    Ok(())
}

fn print_tree(cfbf: &Cfbf, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{:<8} {:>10}  {:>10}    NAME", "TYPE", "START SEC", "SIZE")?;
    let mut printer = TreePrinter {
        out,
        mini_stream_cutoff: cfbf.header().mini_stream_cutoff as u64,
    };
    cfbf.walk_tree(&mut printer)?;
    Ok(())
}

fn dump_path(cfbf: &Cfbf, path: &str, out: &mut dyn Write) -> Result<()> {
    let id = cfbf.find_path(path)?;
    let entry = cfbf.entry(id).expect("find_path returned a valid id").clone();
    match entry.object_type() {
        Some(ObjectType::Root) => {
            return Err(Error::Misuse("you're not allowed to dump the root entry".into()));
        }
        Some(ObjectType::Stream) => {}
        _ => {
            return Err(Error::Misuse(format!("{} is not a stream object", path)));
        }
    }
    cfbf.dump(&entry, out)
}

/// Reads the target stream's raw bytes and, unless `-u` was given, decodes
/// them as UTF-16LE before writing them out. No Quill/Publisher run
/// structure is parsed — this is the raw sector-to-byte path `-r` also uses.
fn extract_text(cfbf: &Cfbf, path: &str, convert_to_utf8: bool, out: &mut dyn Write) -> Result<()> {
    let id = cfbf.find_path(path)?;
    let entry = cfbf.entry(id).expect("find_path returned a valid id").clone();
    if entry.object_type() != Some(ObjectType::Stream) {
        return Err(Error::Misuse(format!("{} is not a stream object", path)));
    }

    let mut raw = Vec::new();
    cfbf.dump(&entry, &mut raw)?;

    if convert_to_utf8 {
        let text = encoding::utf16le_bytes_to_string(&raw)?;
        write!(out, "{}", text)?;
    } else {
        out.write_all(&raw)?;
    }
    Ok(())
}

fn run_walk(cfbf: &Cfbf, out: &mut dyn Write) -> Result<bool> {
    let report = cfbf.run_walker()?;
    for anomaly in &report.anomalies {
        writeln!(out, "{:?}: {}", anomaly.kind, anomaly.message)?;
    }
    Ok(report.is_clean())
}

fn run(config: Config) -> Result<bool> {
    let cfbf = Cfbf::open(&config.input_file)?;
    let mut out = open_output(&config)?;

    match &config.action {
        Action::Header => {
            print_header(&cfbf, out.as_mut())?;
            Ok(true)
        }
        Action::List => {
            print_tree(&cfbf, out.as_mut())?;
            Ok(true)
        }
        Action::Dump(path) => {
            dump_path(&cfbf, path, out.as_mut())?;
            Ok(true)
        }
        Action::ExtractText(path) => {
            extract_text(&cfbf, path, config.convert_to_utf8, out.as_mut())?;
            Ok(true)
        }
        Action::Walk => run_walk(&cfbf, out.as_mut()),
    }
}

fn main() {
    let args = Args::parse();
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    setup_logging(config.log_level);

    match run(config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
