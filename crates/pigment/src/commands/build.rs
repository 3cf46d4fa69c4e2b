//! Build command - Process stylesheets and write the output

use clap::{Args, ValueEnum};
use pigment_atelier_values::ValuesResult;
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use super::{collect_files, print_warnings, process_file, values_options};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Output processed CSS
    #[default]
    Css,
    /// Output JSON with code, warnings, exports and imports
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Json => "json",
        }
    }
}

#[derive(Args)]
pub struct BuildArgs {
    /// Glob pattern(s), directories or files to process (default: ./**/*.css)
    #[arg(default_value = "./**/*.css")]
    pub patterns: Vec<String>,

    /// Output directory (default: ./dist, or stdout for a single file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite the input files
    #[arg(short, long, conflicts_with = "output")]
    pub write: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "css")]
    pub format: OutputFormat,

    /// Config file path (default: ./pigment.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Prefix of generated import aliases
    #[arg(long)]
    pub alias_prefix: Option<String>,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Continue on errors
    #[arg(long)]
    pub continue_on_error: bool,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            patterns: vec!["./**/*.css".to_string()],
            output: None,
            write: false,
            format: OutputFormat::Css,
            config: None,
            alias_prefix: None,
            threads: None,
            continue_on_error: false,
        }
    }
}

/// Where processed output goes
#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    Stdout,
    InPlace,
    Directory(PathBuf),
}

pub fn run(args: BuildArgs) {
    let start = Instant::now();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Failed to configure thread pool: {}", e);
            std::process::exit(1);
        }
    }

    let options = values_options(args.config.as_deref(), args.alias_prefix.as_deref());
    let files = collect_files(&args.patterns);

    if files.is_empty() {
        eprintln!("No .css files found matching the patterns");
        std::process::exit(1);
    }

    let destination = destination(&args, files.len());
    tracing::debug!(files = files.len(), ?destination, "build");

    let success = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let warned = AtomicUsize::new(0);

    let results: Vec<_> = files
        .par_iter()
        .map(|path| match process_file(path, &options) {
            Ok(result) => {
                success.fetch_add(1, Ordering::Relaxed);
                if !result.warnings.is_empty() {
                    warned.fetch_add(result.warnings.len(), Ordering::Relaxed);
                    print_warnings(path, &result.warnings);
                }
                Some((path.clone(), result))
            }
            Err(e) => {
                failed.fetch_add(1, Ordering::Relaxed);
                eprintln!("Error processing {}: {}", path.display(), e);

                if !args.continue_on_error {
                    std::process::exit(1);
                }

                None
            }
        })
        .collect();

    for (path, result) in results.into_iter().flatten() {
        let content = render(&path, &result, args.format);
        match &destination {
            Destination::Stdout => print!("{}", content),
            Destination::InPlace => {
                // JSON reports never replace the stylesheet itself
                let out_path = if args.format == OutputFormat::Css {
                    path.clone()
                } else {
                    path.with_extension(args.format.extension())
                };
                write_output(&out_path, &content);
            }
            Destination::Directory(dir) => {
                write_output(&output_path(dir, &path, args.format), &content);
            }
        }
    }

    let success = success.load(Ordering::Relaxed);
    let failed = failed.load(Ordering::Relaxed);
    let warned = warned.load(Ordering::Relaxed);
    let elapsed = start.elapsed().as_secs_f64();

    if failed > 0 {
        eprintln!(
            "✗ {} file(s) failed, {} processed in {:.4}s",
            failed, success, elapsed
        );
        std::process::exit(1);
    }

    let file_word = if success == 1 { "file" } else { "files" };
    if warned > 0 {
        eprintln!(
            "✓ {} {} processed in {:.4}s ({} warning(s))",
            success, file_word, elapsed, warned
        );
    } else {
        eprintln!("✓ {} {} processed in {:.4}s", success, file_word, elapsed);
    }
}

fn destination(args: &BuildArgs, file_count: usize) -> Destination {
    if args.write {
        return Destination::InPlace;
    }
    match &args.output {
        Some(dir) => Destination::Directory(dir.clone()),
        None if file_count == 1 => Destination::Stdout,
        None => Destination::Directory(PathBuf::from("./dist")),
    }
}

#[derive(serde::Serialize)]
struct FileReport<'a> {
    filename: String,
    #[serde(flatten)]
    result: &'a ValuesResult,
}

fn render(path: &Path, result: &ValuesResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Css => result.code.clone(),
        OutputFormat::Json => {
            let report = FileReport {
                filename: path.display().to_string(),
                result,
            };
            serde_json::to_string_pretty(&report).unwrap_or_default()
        }
    }
}

/// Mirror the input path under the output directory
fn output_path(dir: &Path, path: &Path, format: OutputFormat) -> PathBuf {
    let relative: PathBuf = if path.is_absolute() {
        path.file_name().map(PathBuf::from).unwrap_or_default()
    } else {
        path.components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect()
    };
    dir.join(relative).with_extension(format.extension())
}

fn write_output(out_path: &Path, content: &str) {
    if let Some(parent) = out_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    if let Err(e) = fs::write(out_path, content) {
        eprintln!("Failed to write {}: {}", out_path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pigment_atelier_values::{process_values, ValuesOptions};

    #[test]
    fn test_output_path() {
        let dir = Path::new("dist");
        assert_eq!(
            output_path(dir, Path::new("./src/theme.css"), OutputFormat::Css),
            PathBuf::from("dist/src/theme.css")
        );
        assert_eq!(
            output_path(dir, Path::new("../shared/colors.css"), OutputFormat::Json),
            PathBuf::from("dist/shared/colors.json")
        );
    }

    #[test]
    fn test_destination() {
        let args = BuildArgs::default();
        assert_eq!(destination(&args, 1), Destination::Stdout);
        assert_eq!(
            destination(&args, 3),
            Destination::Directory(PathBuf::from("./dist"))
        );

        let args = BuildArgs {
            write: true,
            ..Default::default()
        };
        assert_eq!(destination(&args, 1), Destination::InPlace);
    }

    #[test]
    fn test_render_json() {
        let result = process_values("@value a from b;", &ValuesOptions::default()).unwrap();
        let json = render(Path::new("a.css"), &result, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["filename"], "a.css");
        assert_eq!(value["exports"]["a"], "__value__a__0");
        assert!(value["code"].as_str().unwrap().starts_with(":import(b)"));
    }
}
