use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg} {wide_bar} {pos}/{len} files [{elapsed_precise}<{eta_precise}]";

/// Console progress for a sequential run over `total` files.
pub fn progress_bar(total: usize, message: &'static str) -> ProgressBar {
    let style =
        ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(total as u64)
        .with_style(style)
        .with_message(message)
}
