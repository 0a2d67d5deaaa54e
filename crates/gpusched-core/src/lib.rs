//! gpusched Core - Fundamental types shared by the gpusched crates
//!
//! This crate provides:
//! - Error types with miette diagnostics
//! - Kubernetes quantity parsing for extended resources
//! - Workload identity keys
//! - YAML helpers for configuration files

pub mod error;
pub mod resources;
pub mod types;

// Re-export commonly used types
pub use error::{GpuschedError, Result};
pub use resources::{parse_quantity, quantity_value};
pub use types::WorkloadKey;

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Node, Pod};
pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Serialize a value to YAML
pub fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| {
        GpuschedError::serialization_error(
            format!("Failed to serialize to YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a value from YAML
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        GpuschedError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        capacity: usize,
    }

    #[test]
    fn test_yaml_serialization() {
        let sample = Sample {
            name: "vgpu-scheduler".to_string(),
            capacity: 300,
        };

        let yaml = to_yaml(&sample).unwrap();
        assert!(yaml.contains("vgpu-scheduler"));

        let parsed: Sample = from_yaml(&yaml).unwrap();
        assert_eq!(parsed, sample);
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        let result: Result<Sample> = from_yaml("name: [unterminated");
        assert!(matches!(
            result,
            Err(GpuschedError::SerializationError { .. })
        ));
    }
}
