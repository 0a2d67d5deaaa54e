use crate::error::{KubeError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use tracing::info;

/// Build a client from an explicit kubeconfig, or infer one
/// (in-cluster service account first, then `~/.kube/config`).
pub async fn init_kube_client(kubeconfig: Option<PathBuf>) -> Result<Client> {
    match kubeconfig {
        Some(path) => {
            info!("Loading kubeconfig from {}", path.display());

            let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| {
                KubeError::connection_failed(format!(
                    "failed to read kubeconfig file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    KubeError::connection_failed(format!(
                        "failed to create config from kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;

            Client::try_from(config).map_err(|e| {
                KubeError::connection_failed(format!(
                    "failed to create client from kubeconfig: {}",
                    e
                ))
            })
        }
        None => Client::try_default().await.map_err(|e| {
            KubeError::connection_failed(format!("failed to infer cluster config: {}", e))
        }),
    }
}
