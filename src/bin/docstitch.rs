//! docstitch CLI tool
//!
//! A command-line tool for merging PDFs behind a clickable table of contents
//! and stitching images into one picture.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;

use docstitch::layout::{ContentsLayout, ContentsOverflow, Margins, PageDimensions};
use docstitch::pdf::{
    extract_best_title, extract_metadata, merge_files_with_contents, DocumentOrder, MergeOptions,
    MergeSettings, DEFAULT_PDF_OUTPUT,
};
use docstitch::pdf::merge::MIN_DOCUMENTS;
use docstitch::raster::{
    merge_image_files, ImageMergeOptions, LoadOutcome, MergeDirection, DEFAULT_IMAGE_OUTPUT,
    DEFAULT_JPEG_QUALITY,
};

/// docstitch - Merge PDFs with a table of contents, or stitch images
#[derive(Parser)]
#[command(name = "docstitch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge numbered PDFs behind a contents page
    docstitch pdf \"[0-9]*.pdf\"

    # Keep the command-line order and open the result
    docstitch pdf --order given -o handout.pdf intro.pdf details.pdf --open

    # Stack screenshots top to bottom
    docstitch images --direction vertical -o strip.jpg *.png

    # Show the title a PDF would get in the contents listing
    docstitch title report.pdf")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge PDF files behind a generated, clickable table of contents
    Pdf(PdfArgs),

    /// Stitch images into one JPEG
    Images {
        /// Input images (PNG, JPEG, BMP). Supports glob patterns like "*.png"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output JPEG file path
        #[arg(short, long, default_value = DEFAULT_IMAGE_OUTPUT)]
        output: PathBuf,

        /// Lay images out side by side or stacked
        #[arg(long, value_enum, default_value_t = DirectionArg::Horizontal)]
        direction: DirectionArg,

        /// JPEG quality (1-100)
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Print the best-guess title of a PDF
    Title {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(Args)]
struct PdfArgs {
    /// Input PDF files. Supports glob patterns like "*.pdf"
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output PDF file path
    #[arg(short, long, default_value = DEFAULT_PDF_OUTPUT)]
    output: PathBuf,

    /// Order of the merged documents
    #[arg(long, value_enum, default_value_t = OrderArg::Name)]
    order: OrderArg,

    /// What to do when the contents listing doesn't fit on one page
    #[arg(long, value_enum, default_value_t = OverflowArg::Paginate)]
    overflow: OverflowArg,

    /// Size of the generated contents page(s)
    #[arg(long, value_enum, default_value_t = PageSizeArg::A4)]
    page_size: PageSizeArg,

    /// Margins of the generated contents page(s)
    #[arg(long, value_enum, default_value_t = MarginsArg::Default)]
    margins: MarginsArg,

    /// Title stored in the output's document properties
    #[arg(long)]
    title: Option<String>,

    /// Open the output file after creation
    #[arg(long)]
    open: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    /// Sort by file name
    Name,
    /// Keep the order given on the command line
    Given,
}

#[derive(Clone, Copy, ValueEnum)]
enum OverflowArg {
    /// Continue the listing on further contents pages
    Paginate,
    /// Drop entries that don't fit on the first page
    Truncate,
}

#[derive(Clone, Copy, ValueEnum)]
enum PageSizeArg {
    A4,
    Letter,
}

#[derive(Clone, Copy, ValueEnum)]
enum MarginsArg {
    /// 72pt at the top, 50pt elsewhere
    Default,
    /// One inch all round
    Standard,
    /// Half an inch all round
    Narrow,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Horizontal,
    Vertical,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,lopdf=error")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pdf(args) => cmd_pdf(args),
        Commands::Images {
            inputs, output, direction, quality, open,
        } => cmd_images(inputs, output, direction, quality, open),
        Commands::Title { input } => cmd_title(&input),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Expand glob patterns in input paths
///
/// Matches of one pattern come out sorted; patterns keep their
/// command-line order.
fn expand_globs(patterns: Vec<String>) -> docstitch::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let entries = glob(&pattern).map_err(|e| docstitch::Error::InvalidGlob(format!("{}: {}", pattern, e)))?;
            let mut matched = Vec::new();
            for entry in entries {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                return Err(docstitch::Error::NoFilesMatched(pattern));
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Merge PDFs behind a contents page
fn cmd_pdf(args: PdfArgs) -> Result<()> {
    let PdfArgs {
        inputs,
        output,
        order,
        overflow,
        page_size,
        margins,
        title,
        open,
    } = args;
    let inputs = expand_globs(inputs)?;

    // Reject before touching any file
    if inputs.len() < MIN_DOCUMENTS {
        return Err(docstitch::Error::NotEnoughDocuments(inputs.len()).into());
    }

    let defaults = ContentsLayout::default();
    let layout = ContentsLayout {
        margins: match margins {
            MarginsArg::Default => defaults.margins,
            MarginsArg::Standard => Margins::standard(),
            MarginsArg::Narrow => Margins::narrow(),
        },
        page: match page_size {
            PageSizeArg::A4 => PageDimensions::a4(),
            PageSizeArg::Letter => PageDimensions::letter(),
        },
        overflow: match overflow {
            OverflowArg::Paginate => ContentsOverflow::Paginate,
            OverflowArg::Truncate => ContentsOverflow::Truncate,
        },
        ..defaults
    };

    let mut settings = MergeSettings {
        order: match order {
            OrderArg::Name => DocumentOrder::ByName,
            OrderArg::Given => DocumentOrder::AsGiven,
        },
        layout,
        ..MergeSettings::default()
    };
    if let Some(title) = title {
        settings.document_title = title;
    }

    eprintln!("Merging {} PDF files...", inputs.len());

    let options = MergeOptions {
        input_paths: inputs,
        output_path: output.clone(),
        settings,
    };
    let outcome = merge_files_with_contents(&options).context("PDF merge failed")?;

    for entry in &outcome.entries {
        eprintln!("  p.{:<4} {}", entry.start_page, entry.title);
    }
    eprintln!(
        "Merged to: {} ({} pages, {} contents)",
        output.display(),
        outcome.page_count,
        outcome.contents_pages
    );

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Stitch images into one JPEG
fn cmd_images(
    inputs: Vec<String>,
    output: PathBuf,
    direction: DirectionArg,
    quality: u8,
    open: bool,
) -> Result<()> {
    let inputs = expand_globs(inputs)?;

    eprintln!("Stitching {} images...", inputs.len());

    let options = ImageMergeOptions {
        direction: match direction {
            DirectionArg::Horizontal => MergeDirection::Horizontal,
            DirectionArg::Vertical => MergeDirection::Vertical,
        },
        quality,
    };
    let outcome = merge_image_files(&inputs, &output, &options).context("Image merge failed")?;

    for item in &outcome.report {
        if let LoadOutcome::Failed { name, reason } = item {
            eprintln!("Warning: skipped {}: {}", name, reason);
        }
    }
    eprintln!("Merged to: {} ({}x{})", output.display(), outcome.width, outcome.height);

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Print the title a PDF would get in the contents listing
fn cmd_title(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(docstitch::Error::FileNotFound(input.to_path_buf()).into());
    }

    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    println!("{}", extract_best_title(&bytes, &name));

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(docstitch::Error::FileNotFound(input.to_path_buf()).into());
    }

    let metadata = extract_metadata(input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}
