pub mod discovery;
pub mod driver;

pub use discovery::{LibraryScanner, PackageSource};
pub use driver::{IndexWorker, ScanDriver, ScanResult};
