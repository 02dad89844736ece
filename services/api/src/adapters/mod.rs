pub mod photo_dir;
pub mod spreadsheet;

pub use photo_dir::PhotoDirectory;
pub use spreadsheet::SpreadsheetStore;
