//! Inspect or re-encode a raw row-major f32 matrix file
//!
//! ```text
//! cargo run --features cli --example matrix_tool -- info matrix.bin --rows 3 --cols 4
//! cargo run --features cli --example matrix_tool -- \
//!     convert matrix.bin out.bin --rows 3 --cols 4 --swap-output
//! ```

use clap::{Args, Parser, Subcommand};
use connmat::{CacheMode, CachePolicy, MatrixStore};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "matrix_tool", about = "Connectivity matrix file utility")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Shape {
    /// Number of rows
    #[arg(long)]
    rows: usize,
    /// Number of columns
    #[arg(long)]
    cols: usize,
    /// Byte offset of the first element
    #[arg(long, default_value_t = 0)]
    offset: u64,
    /// The file uses the opposite byte order from this machine
    #[arg(long)]
    swapped: bool,
    /// Keep the matrix on disk instead of loading it
    #[arg(long)]
    on_disk: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print dimensions and the first row
    Info {
        input: PathBuf,
        #[command(flatten)]
        shape: Shape,
    },
    /// Write the matrix to a new file, optionally changing byte order and offset
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        shape: Shape,
        /// Offset of the data in the output file
        #[arg(long, default_value_t = 0)]
        output_offset: u64,
        /// Write the output in the opposite byte order from this machine
        #[arg(long)]
        swap_output: bool,
    },
}

fn open(input: &Path, shape: &Shape) -> connmat::Result<MatrixStore> {
    let mode = if shape.on_disk {
        CacheMode::OnDisk
    } else {
        CacheMode::InMemory
    };
    let mut store = MatrixStore::new();
    store.set_matrix_file(input, CachePolicy::Anonymous);
    store.setup(&[shape.rows, shape.cols], shape.offset, mode, shape.swapped)?;
    Ok(store)
}

fn run(cli: Cli) -> connmat::Result<()> {
    match cli.command {
        Command::Info { input, shape } => {
            let mut store = open(&input, &shape)?;
            let (rows, cols) = store.dimensions()?;
            println!("{}: {rows} x {cols}", input.display());
            if rows > 0 {
                let row = store.get_row(0)?;
                let preview: Vec<String> = row.iter().take(8).map(|v| format!("{v}")).collect();
                println!("row 0: [{}]", preview.join(", "));
            }
        }
        Command::Convert {
            input,
            output,
            shape,
            output_offset,
            swap_output,
        } => {
            let mut store = open(&input, &shape)?;
            store.write_to_new_file(&output, output_offset, swap_output)?;
            println!("Wrote {}", output.display());
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
