#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod error;
pub mod payload;
pub mod policy;
pub mod stats;

pub mod util {
    pub mod sanitize;
}

pub mod chunking {
    pub mod fixed;
}

pub mod symbol;

pub mod container {
    pub mod manifest;
}

pub mod pack {
    pub mod encoder;
    pub mod walker;
}

pub mod read {
    pub mod extract;
    pub mod inspect;
    pub mod reconstruct;
    pub mod scan;
}

// Re-exports: stable API surface
pub use diagnostics::Diagnostic;
pub use pack::encoder::{EncodeOptions, EncodeReport, Encoder};
pub use policy::{DecodePolicy, DuplicatePolicy, TotalPolicy};
pub use read::extract::{DecodeOptions, DecodeReport, Decoder};
pub use read::inspect::{InspectReport, inspect};
pub use read::reconstruct::{Reconstruction, Reconstructor, reconstruct};
pub use symbol::{Capabilities, EcLevel, SymbolRenderer, SymbolScanner};
