//! # photo-sort CLI
//!
//! Command-line interface for the photo sorter.
//!
//! ## Usage
//! ```bash
//! photo-sort --all --model-command "python detect.py" --image-dir img
//! photo-sort --detect --model-command "python detect.py"
//! ```

mod cli;

use photo_sorter::Result;

fn main() -> Result<()> {
    photo_sorter::init_tracing();
    cli::run()
}
