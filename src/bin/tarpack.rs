use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use tokio::io::{AsyncWrite, BufWriter};

use tarstream::{EntryAttributes, PackerOptions, TarPacker};

/// tarpack: stream local files into a tar archive
#[derive(Debug, Parser)]
#[clap(name = "tarpack", version)]
pub struct App {
    /// Write the archive here instead of stdout
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// Permission bits for every entry, in octal
    #[clap(long, value_parser = parse_octal_mode)]
    mode: Option<u32>,

    #[clap(long)]
    uid: Option<u64>,

    #[clap(long)]
    gid: Option<u64>,

    /// Modification time as a Unix timestamp (default: the epoch)
    #[clap(long, conflicts_with = "now")]
    mtime: Option<u64>,

    /// Use the current time as the default modification time
    #[clap(long)]
    now: bool,

    /// Files and directories to add, in order. Directories are not recursed
    /// into.
    #[clap(required = true)]
    paths: Vec<PathBuf>,
}

fn parse_octal_mode(value: &str) -> Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(value.trim_start_matches("0o"), 8)
}

/// Archive-relative name for a local path.
fn entry_name(path: &Path) -> Result<String> {
    let Some(name) = path.to_str() else {
        bail!("{path:?} is not valid UTF-8");
    };
    let name = name.trim_start_matches("./").trim_start_matches('/');
    if name.is_empty() {
        bail!("{path:?} has no archive name");
    }
    Ok(name.to_string())
}

async fn pack(args: &App, sink: impl AsyncWrite + Unpin) -> Result<()> {
    let options = if args.now {
        PackerOptions::with_current_mtime()
    } else {
        PackerOptions::default()
    };
    let attrs = EntryAttributes {
        mode: args.mode,
        uid: args.uid,
        gid: args.gid,
        mtime: args.mtime,
        entry_type: None,
    };

    let mut packer = TarPacker::with_options(BufWriter::new(sink), options);
    for path in &args.paths {
        let name = entry_name(path)?;
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("opening {path:?}"))?;
        let metadata = file.metadata().await?;

        if metadata.is_dir() {
            packer.add_dir(&name, &attrs).await?;
            info!("added directory {name}");
        } else {
            let size = metadata.len();
            packer
                .add_reader(&name, &attrs, size, file)
                .await
                .with_context(|| format!("adding {path:?}"))?;
            info!("added {name} ({size} bytes)");
        }
    }
    packer.finish().await?;
    info!(
        "wrote {} entries, {} bytes",
        packer.entries(),
        packer.bytes_written()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = App::parse();

    match &args.output {
        Some(output) => {
            let file = tokio::fs::File::create(output)
                .await
                .with_context(|| format!("creating {output:?}"))?;
            pack(&args, file).await
        }
        None => pack(&args, tokio::io::stdout()).await,
    }
}
