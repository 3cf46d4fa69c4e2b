//! Check command - Report warnings and errors without writing output

use clap::Args;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use super::{collect_files, print_warnings, process_file, values_options};

#[derive(Args)]
pub struct CheckArgs {
    /// Glob pattern(s), directories or files to check
    #[arg(default_value = "./**/*.css")]
    pub patterns: Vec<String>,

    /// Config file path (default: ./pigment.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exit with an error when any warning is reported
    #[arg(long)]
    pub deny_warnings: bool,

    /// Quiet mode - only show summary
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: CheckArgs) {
    let start = Instant::now();
    let options = values_options(args.config.as_deref(), None);
    let files = collect_files(&args.patterns);

    if files.is_empty() {
        eprintln!("No .css files found matching patterns: {:?}", args.patterns);
        return;
    }

    let error_count = AtomicUsize::new(0);
    let warning_count = AtomicUsize::new(0);

    files
        .par_iter()
        .for_each(|path| match process_file(path, &options) {
            Ok(result) => {
                warning_count.fetch_add(result.warnings.len(), Ordering::Relaxed);
                if !args.quiet {
                    print_warnings(path, &result.warnings);
                }
            }
            Err(e) => {
                error_count.fetch_add(1, Ordering::Relaxed);
                eprintln!("{}: error: {}", path.display(), e);
            }
        });

    let errors = error_count.load(Ordering::Relaxed);
    let warnings = warning_count.load(Ordering::Relaxed);

    eprintln!(
        "Checked {} file(s) in {:.4}s: {} error(s), {} warning(s)",
        files.len(),
        start.elapsed().as_secs_f64(),
        errors,
        warnings
    );

    if failed(errors, warnings, args.deny_warnings) {
        std::process::exit(1);
    }
}

#[inline]
fn failed(errors: usize, warnings: usize, deny_warnings: bool) -> bool {
    errors > 0 || (deny_warnings && warnings > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy() {
        assert!(!failed(0, 0, false));
        assert!(!failed(0, 2, false));
        assert!(failed(0, 2, true));
        assert!(failed(1, 0, false));
    }
}
