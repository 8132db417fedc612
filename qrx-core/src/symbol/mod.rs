use crate::error::{QrxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Error-correction level: capacity traded for damage tolerance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl FromStr for EcLevel {
    type Err = QrxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::L),
            "M" => Ok(EcLevel::M),
            "Q" => Ok(EcLevel::Q),
            "H" => Ok(EcLevel::H),
            other => Err(QrxError::Format(format!(
                "unknown error-correction level {other:?} (expected L, M, Q or H)"
            ))),
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
            EcLevel::H => "H",
        };
        f.write_str(s)
    }
}

/// Turns one payload text into an encoded image.
pub trait SymbolRenderer: Send + Sync {
    /// File extension (without the dot) of the images this renderer emits.
    fn extension(&self) -> &'static str;

    /// Fails when the payload does not fit any supported symbol size at `level`.
    fn render(&self, payload: &str, level: EcLevel) -> Result<Vec<u8>>;
}

/// Finds zero or more symbols in an image and returns their raw contents.
pub trait SymbolScanner: Send + Sync {
    fn scan(&self, image: &[u8]) -> Result<Vec<Vec<u8>>>;
}

/// Renderer and scanner resolved once, up front, and handed to the pipeline.
#[derive(Clone)]
pub struct Capabilities {
    pub renderer: Arc<dyn SymbolRenderer>,
    pub scanner: Arc<dyn SymbolScanner>,
}

impl Capabilities {
    pub fn new(renderer: Arc<dyn SymbolRenderer>, scanner: Arc<dyn SymbolScanner>) -> Self {
        Self { renderer, scanner }
    }

    /// The symbol engines compiled into this build.
    pub fn detect() -> Result<Self> {
        #[cfg(feature = "qr")]
        {
            Ok(Self::new(
                Arc::new(qr::QrRenderer::default()),
                Arc::new(qr::QrScanner),
            ))
        }
        #[cfg(not(feature = "qr"))]
        {
            Err(QrxError::Capability(
                "built without the `qr` feature: no symbol renderer or scanner".to_string(),
            ))
        }
    }
}

#[cfg(feature = "qr")]
pub mod qr;
