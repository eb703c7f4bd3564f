use ::ssh2::{Session, Sftp};
use ::std::io;
use ::std::net::{TcpStream, ToSocketAddrs};
use ::std::time::Duration;
use ::tokio::task;

use crate::config::SftpConfig;
use crate::errors::TransferError;
use crate::imports::*;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote hand-off seam used by the run coordinator.
#[allow(async_fn_in_trait)]
pub trait Push: Send + Sync {
    /// Uploads overwrite any existing remote file of the same name. At most one
    /// attempt per call.
    async fn push(&self, local_paths: &[PathBuf]) -> Result<(), TransferError>;
}

pub struct SftpTransfer {
    config: SftpConfig,
}

impl SftpTransfer {
    pub fn new(config: SftpConfig) -> SftpTransfer {
        SftpTransfer { config }
    }
}

impl Push for SftpTransfer {
    async fn push(&self, local_paths: &[PathBuf]) -> Result<(), TransferError> {
        let config = self.config.clone();
        let paths = local_paths.to_vec();
        // libssh2 is blocking; keep it off the async worker.
        match task::spawn_blocking(move || push_blocking(&config, &paths)).await {
            Ok(result) => result,
            Err(join_error) => Err(TransferError::RemoteWriteFailure {
                remote_path: self.config.remote_dir.clone(),
                message: format!("transfer task aborted: {}", join_error),
            }),
        }
    }
}

fn push_blocking(config: &SftpConfig, paths: &[PathBuf]) -> Result<(), TransferError> {
    info!("Opening SFTP session to {}@{}:{}", config.username, config.host, config.port);
    let session = open_session(config)?;
    let inner = || {
        let sftp = session
            .sftp()
            .map_err(|e| network_failure(config, format!("failed to open SFTP channel: {}", e)))?;
        ensure_remote_dir(&sftp, config);
        for path in paths {
            upload(&sftp, config, path)?;
        }
        Ok(())
    };
    let result = inner();
    // Session is scoped to this push: released on every exit path.
    if let Err(error) = session.disconnect(None, "done", None) {
        debug!("Failed to disconnect SFTP session cleanly: {}", error);
    }
    result
}

fn open_session(config: &SftpConfig) -> Result<Session, TransferError> {
    let addr = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|e| network_failure(config, e.to_string()))?
        .next()
        .ok_or_else(|| network_failure(config, "host resolved to no address".to_string()))?;
    let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| network_failure(config, e.to_string()))?;
    let mut session = Session::new().map_err(|e| network_failure(config, e.to_string()))?;
    session.set_tcp_stream(tcp);
    session.handshake().map_err(|e| network_failure(config, e.to_string()))?;
    session
        .userauth_password(&config.username, config.password.as_deref().unwrap_or_default())
        .map_err(|e| TransferError::AuthFailure {
            host: config.host.clone(),
            username: config.username.clone(),
            message: e.to_string(),
        })?;
    Ok(session)
}

fn ensure_remote_dir(sftp: &Sftp, config: &SftpConfig) {
    let remote_dir = Path::new(&config.remote_dir);
    if sftp.stat(remote_dir).is_err() {
        if let Err(error) = sftp.mkdir(remote_dir, 0o755) {
            // A missing directory will surface as a RemoteWriteFailure on upload.
            debug!("Could not create remote directory {:?}: {}", remote_dir, error);
        }
    }
}

fn upload(sftp: &Sftp, config: &SftpConfig, local_path: &Path) -> Result<(), TransferError> {
    let remote_path = remote_path_for(&config.remote_dir, local_path).map_err(|e| {
        TransferError::RemoteWriteFailure { remote_path: config.remote_dir.clone(), message: format!("{:#}", e) }
    })?;
    let remote_write =
        |message: String| TransferError::RemoteWriteFailure { remote_path: remote_path.clone(), message };
    let mut local_file = fs::File::open(local_path)
        .map_err(|e| remote_write(format!("failed to open local file {:?}: {}", local_path, e)))?;
    let mut remote_file = sftp.create(Path::new(&remote_path)).map_err(|e| remote_write(e.to_string()))?;
    let bytes = io::copy(&mut local_file, &mut remote_file).map_err(|e| remote_write(e.to_string()))?;
    info!("Uploaded {:?} to {:?} ({} bytes)", local_path, remote_path, bytes);
    Ok(())
}

fn remote_path_for(remote_dir: &str, local_path: &Path) -> Result<String> {
    let file_name =
        local_path.file_name().ok_or_else(|| anyhow!("Local path has no file name: {:?}", local_path))?;
    Ok(format!("{}/{}", remote_dir.trim_end_matches('/'), file_name.to_string_lossy()))
}

fn network_failure(config: &SftpConfig, message: String) -> TransferError {
    TransferError::NetworkFailure { host: config.host.clone(), port: config.port, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_path_for_joins_file_name() -> Result<()> {
        assert_eq!(remote_path_for("/srv/vols", Path::new("/data/vols_data.csv"))?, "/srv/vols/vols_data.csv");
        assert_eq!(remote_path_for("/srv/vols/", Path::new("vols_data.csv"))?, "/srv/vols/vols_data.csv");
        assert!(remote_path_for("/srv/vols", Path::new("/")).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_failure_and_preserves_local_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let local = dir.path().join("vols_data.csv");
        fs::write(&local, "date_collecte\n")?;
        let transfer = SftpTransfer::new(SftpConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            username: "pi".to_string(),
            password: Some("nope".to_string()),
            remote_dir: "/srv/vols".to_string(),
        });
        let result = transfer.push(&[local.clone()]).await;
        assert!(matches!(result, Err(TransferError::NetworkFailure { port: 1, .. })));
        assert_eq!(fs::read_to_string(&local)?, "date_collecte\n");
        Ok(())
    }
}
