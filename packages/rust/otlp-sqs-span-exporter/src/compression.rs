//! Compression scheme selection and application for serialized span payloads.
//!
//! The scheme is chosen once per serializer, either explicitly or from the
//! standard OTLP environment variables, and applied to the protobuf-encoded
//! bytes before base64 encoding. `OTEL_EXPORTER_OTLP_TRACES_COMPRESSION`
//! takes precedence over `OTEL_EXPORTER_OTLP_COMPRESSION`; an unrecognized
//! value is a construction error, never a silent fallback.

use flate2::write::{GzEncoder, ZlibEncoder};
use std::env;
use std::io::{self, Write};
use std::str::FromStr;

use crate::constants::env_vars;
use crate::ExporterBuildError;

/// Compression applied to the OTLP payload before base64 encoding.
///
/// `Deflate` produces a raw zlib stream; `Gzip` adds the gzip header and
/// trailer, so for the same input its output is never shorter than the
/// deflate output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Payload bytes are passed through unchanged.
    #[default]
    None,
    /// zlib-framed deflate.
    Deflate,
    /// gzip-framed deflate.
    Gzip,
}

impl FromStr for Compression {
    type Err = ExporterBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "none" => Ok(Compression::None),
            "deflate" => Ok(Compression::Deflate),
            "gzip" => Ok(Compression::Gzip),
            other => Err(ExporterBuildError::UnsupportedCompression(
                other.to_string(),
            )),
        }
    }
}

impl Compression {
    /// Resolves the compression scheme from the environment.
    ///
    /// The trace-specific variable overrides the general one; when neither is
    /// set the scheme defaults to [`Compression::None`].
    pub fn from_env() -> Result<Self, ExporterBuildError> {
        match env::var(env_vars::OTLP_TRACES_COMPRESSION)
            .or_else(|_| env::var(env_vars::OTLP_COMPRESSION))
        {
            Ok(value) => value.parse(),
            Err(_) => Ok(crate::constants::defaults::COMPRESSION),
        }
    }

    /// Applies this scheme to a payload.
    pub fn compress(&self, data: Vec<u8>) -> io::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data),
            Compression::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&data)?;
                encoder.finish()
            }
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&data)?;
                encoder.finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;

    #[test]
    fn test_parse_known_values() {
        assert_eq!("none".parse::<Compression>().unwrap(), Compression::None);
        assert_eq!(
            "deflate".parse::<Compression>().unwrap(),
            Compression::Deflate
        );
        assert_eq!("gzip".parse::<Compression>().unwrap(), Compression::Gzip);
        // Values are lowercased and trimmed before interpretation
        assert_eq!(
            " GZIP ".parse::<Compression>().unwrap(),
            Compression::Gzip
        );
    }

    #[test]
    fn test_parse_unknown_value_fails() {
        let err = "snappy".parse::<Compression>().unwrap_err();
        assert!(matches!(
            err,
            ExporterBuildError::UnsupportedCompression(v) if v == "snappy"
        ));
    }

    #[sealed_test]
    fn test_from_env_defaults_to_none() {
        std::env::remove_var(env_vars::OTLP_TRACES_COMPRESSION);
        std::env::remove_var(env_vars::OTLP_COMPRESSION);
        assert_eq!(Compression::from_env().unwrap(), Compression::None);
    }

    #[sealed_test]
    fn test_from_env_traces_variable_takes_precedence() {
        std::env::set_var(env_vars::OTLP_COMPRESSION, "gzip");
        std::env::set_var(env_vars::OTLP_TRACES_COMPRESSION, "deflate");
        assert_eq!(Compression::from_env().unwrap(), Compression::Deflate);
    }

    #[sealed_test]
    fn test_from_env_falls_back_to_general_variable() {
        std::env::remove_var(env_vars::OTLP_TRACES_COMPRESSION);
        std::env::set_var(env_vars::OTLP_COMPRESSION, "gzip");
        assert_eq!(Compression::from_env().unwrap(), Compression::Gzip);
    }

    #[sealed_test]
    fn test_from_env_rejects_unknown_value() {
        std::env::set_var(env_vars::OTLP_TRACES_COMPRESSION, "zstd");
        assert!(Compression::from_env().is_err());
    }

    #[test]
    fn test_gzip_output_never_shorter_than_deflate() {
        let payload = b"a protobuf-encoded span payload".to_vec();
        let gzip = Compression::Gzip.compress(payload.clone()).unwrap();
        let deflate = Compression::Deflate.compress(payload).unwrap();
        assert!(gzip.len() >= deflate.len());
    }

    #[test]
    fn test_none_passes_payload_through() {
        let payload = vec![1u8, 2, 3];
        assert_eq!(Compression::None.compress(payload.clone()).unwrap(), payload);
    }
}
