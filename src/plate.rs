mod clahe;
mod normalizer;
mod reader;

pub use clahe::clahe;
pub use normalizer::PlateNormalizer;
pub use reader::PlateReader;
