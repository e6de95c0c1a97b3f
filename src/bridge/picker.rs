use std::path::PathBuf;
use tracing::debug;

pub trait FilePicker: Send {
    fn pick_files(&mut self, extensions: &[String]) -> Option<Vec<PathBuf>>;
    fn pick_folders(&mut self) -> Option<Vec<PathBuf>>;
}

#[derive(Debug, Default)]
pub struct NativePicker;

impl FilePicker for NativePicker {
    fn pick_files(&mut self, extensions: &[String]) -> Option<Vec<PathBuf>> {
        debug!("opening file dialog");
        rfd::FileDialog::new()
            .set_title("Select files")
            .set_directory(".")
            .add_filter("Media files", extensions)
            .pick_files()
    }

    fn pick_folders(&mut self) -> Option<Vec<PathBuf>> {
        debug!("opening folder dialog");
        rfd::FileDialog::new()
            .set_title("Select folders")
            .set_directory(".")
            .pick_folders()
    }
}
