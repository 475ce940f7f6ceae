//! Kubernetes implementation of the cluster ports, backed by `kube`.
//!
//! Pods are built here from [`ResourceSpec`]s, so the ownership labels,
//! restart policy and container name are applied in one place.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::{FutureExt, SinkExt};
use k8s_openapi::api::core::v1::{Container, EnvVar as PodEnvVar, Pod, PodSpec, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Status};
use kube::api::{Api, AttachParams, DeleteParams, ListParams, LogParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::ports::{
    BoxedReader, BoxedWriter, Deletion, ExecChannel, RemoteProcess, ServiceDiscovery,
    TunnelDialer, Upstream, WorkloadApi,
};
use crate::domain::resource::{MAIN_CONTAINER, ownership_labels};
use crate::domain::{
    LifecyclePhase, RemoteExit, ResourceHandle, ResourceSpec, StatusSnapshot, TerminalSize,
};

/// How to reach the cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    /// Explicit kubeconfig file; otherwise the usual discovery applies
    /// (`KUBECONFIG`, `~/.kube/config`, in-cluster).
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one.
    pub context: Option<String>,
    /// Namespace override; otherwise the context's namespace.
    pub namespace: Option<String>,
}

/// Cluster client shared by every operation of one invocation.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    namespace: String,
}

impl KubeCluster {
    /// Load credentials and build a client.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable kubeconfig is found or the client
    /// cannot be built from it.
    pub async fn connect(options: &ClusterOptions) -> Result<Self> {
        let kube_options = KubeConfigOptions {
            context: options.context.clone(),
            ..KubeConfigOptions::default()
        };
        let config = match (&options.kubeconfig, &options.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("cannot read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &kube_options)
                    .await
                    .with_context(|| format!("invalid kubeconfig {}", path.display()))?
            }
            (None, Some(context)) => Config::from_kubeconfig(&kube_options)
                .await
                .with_context(|| format!("cannot load kubeconfig context {context}"))?,
            (None, None) => Config::infer()
                .await
                .context("cannot find a kubeconfig or in-cluster configuration")?,
        };

        let namespace = options
            .namespace
            .clone()
            .unwrap_or_else(|| config.default_namespace.clone());
        info!(cluster = %config.cluster_url, namespace, "connecting to cluster");
        let client = Client::try_from(config).context("cannot build kubernetes client")?;
        Ok(Self { client, namespace })
    }

    /// Namespace operations default to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}

/// Render `spec` as a single-container pod that never restarts.
#[must_use]
pub fn build_pod(spec: &ResourceSpec) -> Pod {
    let non_empty = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());
    let env = (!spec.env.is_empty()).then(|| {
        spec.env
            .iter()
            .map(|e| PodEnvVar {
                name: e.name.clone(),
                value: Some(e.value.clone()),
                ..PodEnvVar::default()
            })
            .collect()
    });
    Pod {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            namespace: Some(spec.namespace.clone()),
            labels: Some(ownership_labels()),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            restart_policy: Some("Never".to_string()),
            containers: vec![Container {
                name: MAIN_CONTAINER.to_string(),
                image: Some(spec.image.clone()),
                command: non_empty(&spec.command),
                args: non_empty(&spec.args),
                env,
                tty: Some(spec.tty),
                stdin: Some(spec.stdin),
                ..Container::default()
            }],
            ..PodSpec::default()
        }),
        ..Pod::default()
    }
}

/// Read phase, reason and the main container's exit code off a pod.
///
/// A pod without a reported phase has just been admitted and reads as
/// `Pending`.
#[must_use]
pub fn snapshot_of(pod: &Pod) -> StatusSnapshot {
    let Some(status) = pod.status.as_ref() else {
        return StatusSnapshot::with_phase(LifecyclePhase::Pending);
    };
    let phase = status
        .phase
        .as_deref()
        .map_or(LifecyclePhase::Pending, LifecyclePhase::from);
    let exit_code = status
        .container_statuses
        .iter()
        .flatten()
        .find(|c| c.name == MAIN_CONTAINER)
        .and_then(|c| c.state.as_ref())
        .and_then(|s| s.terminated.as_ref())
        .map(|t| t.exit_code);
    StatusSnapshot {
        phase,
        reason: status.reason.clone(),
        message: status.message.clone(),
        exit_code,
    }
}

fn remote_exit(status: Option<Status>) -> RemoteExit {
    match status {
        Some(s) if s.status.as_deref() == Some("Success") => RemoteExit::success(),
        Some(s) => RemoteExit::failure(
            s.message
                .or(s.reason)
                .unwrap_or_else(|| "remote process failed".to_string()),
        ),
        None => RemoteExit::failure("connection closed before the process reported its exit"),
    }
}

fn selector_string(selector: &BTreeMap<String, String>) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

impl WorkloadApi for KubeCluster {
    async fn create_pod(&self, spec: &ResourceSpec) -> Result<()> {
        self.pods(&spec.namespace)
            .create(&PostParams::default(), &build_pod(spec))
            .await
            .context("pod creation rejected")?;
        Ok(())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<Deletion> {
        let params = DeleteParams {
            grace_period_seconds: Some(0),
            ..DeleteParams::default()
        };
        match self.pods(namespace).delete(name, &params).await {
            Ok(_) => Ok(Deletion::Deleted),
            Err(e) if is_not_found(&e) => Ok(Deletion::NotFound),
            Err(e) => Err(e).context("pod deletion rejected"),
        }
    }

    async fn pod_status(&self, namespace: &str, name: &str) -> Result<Option<StatusSnapshot>> {
        let pod = self
            .pods(namespace)
            .get_opt(name)
            .await
            .context("cannot read pod")?;
        Ok(pod.as_ref().map(snapshot_of))
    }

    async fn pod_logs(&self, namespace: &str, name: &str) -> Result<String> {
        let params = LogParams {
            container: Some(MAIN_CONTAINER.to_string()),
            ..LogParams::default()
        };
        self.pods(namespace)
            .logs(name, &params)
            .await
            .context("cannot read pod logs")
    }
}

impl ServiceDiscovery for KubeCluster {
    async fn service_selector(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let service = services
            .get_opt(name)
            .await
            .with_context(|| format!("cannot read service {name}"))?;
        Ok(service.map(|s| s.spec.and_then(|spec| spec.selector).unwrap_or_default()))
    }

    async fn first_pod_matching(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Option<String>> {
        let params = ListParams::default()
            .labels(&selector_string(selector))
            .limit(1);
        let pods = self
            .pods(namespace)
            .list(&params)
            .await
            .context("cannot list pods")?;
        Ok(pods.items.into_iter().find_map(|p| p.metadata.name))
    }
}

impl ExecChannel for KubeCluster {
    async fn exec(
        &self,
        handle: &ResourceHandle,
        command: &[String],
        tty: bool,
    ) -> Result<RemoteProcess> {
        let params = if tty {
            AttachParams::interactive_tty()
        } else {
            AttachParams::default().stdin(true)
        }
        .container(MAIN_CONTAINER);

        let mut attached = self
            .pods(handle.namespace())
            .exec(handle.name(), command.to_vec(), &params)
            .await
            .context("exec request rejected")?;

        let resize = attached.terminal_size().map(|mut sink| {
            let (tx, mut rx) = mpsc::channel::<TerminalSize>(4);
            tokio::spawn(async move {
                while let Some(size) = rx.recv().await {
                    let size = kube::api::TerminalSize {
                        width: size.width,
                        height: size.height,
                    };
                    if sink.send(size).await.is_err() {
                        break;
                    }
                }
            });
            tx
        });

        let stdin = attached
            .stdin()
            .map(|s| Box::new(s) as BoxedWriter);
        let stdout = attached
            .stdout()
            .map(|s| Box::new(s) as BoxedReader);
        let stderr = attached
            .stderr()
            .map(|s| Box::new(s) as BoxedReader);
        let status = attached.take_status();

        let exit = async move {
            let status = match status {
                Some(status) => status.await,
                None => None,
            };
            if let Err(e) = attached.join().await {
                debug!("exec connection closed with error: {e}");
            }
            remote_exit(status)
        }
        .boxed();

        Ok(RemoteProcess {
            stdin,
            stdout,
            stderr,
            resize,
            exit,
        })
    }
}

impl TunnelDialer for KubeCluster {
    async fn dial(&self, target: &ResourceHandle, remote_port: u16) -> Result<Upstream> {
        let mut forwarder = self
            .pods(target.namespace())
            .portforward(target.name(), &[remote_port])
            .await
            .with_context(|| format!("port-forward to {target} rejected"))?;
        let stream = forwarder
            .take_stream(remote_port)
            .with_context(|| format!("no stream for port {remote_port}"))?;
        let finish = async move {
            forwarder
                .join()
                .await
                .context("port-forward connection failed")
        }
        .boxed();
        Ok(Upstream {
            stream: Box::new(stream),
            finish,
        })
    }
}
