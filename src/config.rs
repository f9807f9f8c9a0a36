// ABOUTME: Version/banner constants shared by the CLI's `clap` surface.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BANNER: &str = "l0c — L0 evaluator, sigmatch, and the AMD64 emitter";
