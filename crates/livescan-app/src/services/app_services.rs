// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: resolves configuration once and hands out the
// bridge, workflow and clients the commands need.
//
// Configuration layers, lowest first: defaults, `config.json` in the data
// directory, `LIVESCAN_*` environment variables, the `--api-base` flag.

use std::path::{Path, PathBuf};

use livescan_bridge::{Capabilities, platform_bridge};
use livescan_client::{ApiClient, DeliverySubmitter, DownloadVerifier, SessionClient, SessionCredentials};
use livescan_core::AppConfig;
use livescan_core::error::Result;
use livescan_core::types::ConsentKind;
use livescan_workflow::WorkflowStateMachine;
use tracing::{debug, info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const DOWNLOADS_DIR: &str = "downloads";

pub struct AppServices {
    config: AppConfig,
    data_dir: PathBuf,
    api: ApiClient,
    sessions: SessionClient,
}

impl AppServices {
    /// Initialise from the real data directory and environment.
    pub fn init(api_base: Option<String>) -> Result<Self> {
        let dir = data_dir::data_dir()?;
        Self::load(dir, |key| std::env::var(key).ok(), api_base)
    }

    /// Initialise from `dir`, an environment lookup and an optional CLI
    /// override of the service origin.
    pub fn load(
        dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
        api_base: Option<String>,
    ) -> Result<Self> {
        let mut config = load_or_create_config(&dir).with_overrides(env);
        if let Some(base) = api_base {
            config.api_base = base;
        }
        let config = config.validated()?;

        let api = ApiClient::from_config(&config)?;
        info!(api_base = %config.api_base, data_dir = %dir.display(), "app services initialised");
        Ok(Self {
            sessions: SessionClient::new(api.clone()),
            config,
            data_dir: dir,
            api,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Where redeemed artifacts are saved, created if missing.
    pub fn download_dir(&self) -> Result<PathBuf> {
        let dir = self
            .config
            .download_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DOWNLOADS_DIR));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Platform capabilities with `frame_source` as the camera image.
    pub fn capabilities(
        &self,
        frame_source: Option<PathBuf>,
        download_dir: Option<PathBuf>,
    ) -> Result<Capabilities> {
        let download_dir = match download_dir {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                dir
            }
            None => self.download_dir()?,
        };
        let caps = platform_bridge(frame_source, download_dir, self.config.haptics);
        debug!(platform = %caps.platform_name, "platform bridge ready");
        Ok(caps)
    }

    pub fn workflow(&self, caps: &Capabilities) -> WorkflowStateMachine {
        let submitter = DeliverySubmitter::new(self.api.clone(), caps.haptics.clone());
        WorkflowStateMachine::new(caps.camera.clone(), submitter)
    }

    pub fn verifier(&self, caps: &Capabilities, token: &str) -> DownloadVerifier {
        DownloadVerifier::new(
            self.api.clone(),
            caps.saver.clone(),
            caps.haptics.clone(),
            token,
        )
    }

    pub async fn health(&self) -> Result<()> {
        self.api.health().await
    }

    // -- Consent receipts ----------------------------------------------------

    /// Open a receipt session when receipts are enabled. Failures are logged
    /// and never block the journey.
    pub async fn consent_session(&self) -> Option<SessionCredentials> {
        if !self.config.record_consents {
            return None;
        }
        match self.sessions.init().await {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!(error = %e, "consent receipts unavailable for this session");
                None
            }
        }
    }

    /// Record one consent receipt, best effort.
    pub async fn record_consent(&self, session: Option<&SessionCredentials>, kind: ConsentKind) {
        let Some(credentials) = session else {
            return;
        };
        if let Err(e) = self.sessions.record_consent(credentials, kind).await {
            warn!(error = %e, ?kind, "consent receipt not recorded");
        }
    }
}

// -- Config file persistence -------------------------------------------------

/// Read `config.json`. A missing file is created with defaults; an
/// unreadable one is left alone and defaults are used.
fn load_or_create_config(data_dir: &Path) -> AppConfig {
    let path = data_dir.join(CONFIG_FILE);
    match std::fs::read_to_string(&path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring malformed config");
            AppConfig::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let config = AppConfig::default();
            if let Err(e) = persist_config(data_dir, &config) {
                warn!(error = %e, "could not write default config");
            }
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config");
            AppConfig::default()
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use livescan_core::config::ENV_API_BASE;
    use livescan_core::error::LiveScanError;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn first_run_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::load(dir.path().to_path_buf(), no_env, None).unwrap();

        assert_eq!(services.config().api_base, "http://127.0.0.1:8000");
        let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let parsed: AppConfig = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn flag_beats_environment_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"api_base": "https://file.example.com"}"#,
        )
        .unwrap();
        let env = |key: &str| (key == ENV_API_BASE).then(|| "https://env.example.com/".to_owned());

        let from_env = AppServices::load(dir.path().to_path_buf(), env, None).unwrap();
        assert_eq!(from_env.config().api_base, "https://env.example.com");

        let from_flag = AppServices::load(
            dir.path().to_path_buf(),
            env,
            Some("https://flag.example.com".into()),
        )
        .unwrap();
        assert_eq!(from_flag.config().api_base, "https://flag.example.com");
    }

    #[test]
    fn malformed_config_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();

        let services = AppServices::load(dir.path().to_path_buf(), no_env, None).unwrap();
        assert_eq!(services.config(), &AppConfig::default());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(),
            "{not json"
        );
    }

    #[test]
    fn invalid_origin_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppServices::load(
            dir.path().to_path_buf(),
            no_env,
            Some("ftp://scan.example.com".into()),
        );
        assert!(matches!(result, Err(LiveScanError::Config(_))));
    }

    #[test]
    fn downloads_default_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::load(dir.path().to_path_buf(), no_env, None).unwrap();
        let downloads = services.download_dir().unwrap();
        assert_eq!(downloads, dir.path().join(DOWNLOADS_DIR));
        assert!(downloads.is_dir());
    }

    #[tokio::test]
    async fn receipts_disabled_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::load(dir.path().to_path_buf(), no_env, None).unwrap();
        assert!(services.consent_session().await.is_none());
    }
}
