//! 現在地の取得（GPS相当のケイパビリティ）。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::{
    config::{GeoProvider, GeolocationCfg},
    notify::Toast,
};

/// 緯度経度（度）。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl std::fmt::Display for Coordinates {
    /// 小数点以下6桁で "lat, lon" 形式にする。
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// 位置取得の失敗。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GeoError {
    /// 環境が位置取得に対応していない。
    #[error("geolocation is not available")]
    Unavailable,
    /// 拒否された、または位置を決定できなかった。
    #[error("could not determine position: {0}")]
    Failed(String),
}

impl GeoError {
    /// 利用者向けのトーストへ変換する。
    pub fn toast(&self) -> Toast {
        match self {
            GeoError::Unavailable => {
                Toast::destructive("GPS não disponível", "Digite o endereço manualmente.")
            }
            GeoError::Failed(_) => Toast::destructive(
                "Erro de localização",
                "Não foi possível obter sua localização. Digite o endereço manualmente.",
            ),
        }
    }
}

/// 単発の現在地取得。
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

/// 設定された座標をそのまま返す。
pub struct FixedLocator {
    coords: Coordinates,
}

impl FixedLocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coords: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl GeoLocator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Ok(self.coords)
    }
}

/// ip-api互換エンドポイントの応答。
#[derive(Debug, Deserialize)]
struct IpLookupResp {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpLookupResp {
    fn into_coordinates(self) -> Result<Coordinates, GeoError> {
        if self.status != "success" {
            return Err(GeoError::Failed(
                self.message.unwrap_or_else(|| self.status.clone()),
            ));
        }
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(GeoError::Failed("response without coordinates".into())),
        }
    }
}

/// IPアドレスから概略位置を引く。
pub struct IpLocator {
    http: Client,
    endpoint: String,
}

impl IpLocator {
    /// タイムアウトはHTTPクライアント側に任せる。
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = endpoint.into();
        if is_plain_http(&endpoint) {
            tracing::warn!("ip lookup endpoint is not encrypted: {endpoint}");
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }
}

/// 平文HTTPの宛先か（IPアドレスと位置が暗号化されずに流れる）。
fn is_plain_http(endpoint: &str) -> bool {
    endpoint
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http://"))
}

#[async_trait]
impl GeoLocator for IpLocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        tracing::info!("ip lookup: {}", self.endpoint);
        let resp = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GeoError::Failed(e.to_string()))?
            .json::<IpLookupResp>()
            .await
            .map_err(|e| GeoError::Failed(e.to_string()))?;
        resp.into_coordinates()
    }
}

/// 設定からロケータを組み立てる。無効ならNone（非対応環境扱い）。
pub fn locator_from_config(cfg: &GeolocationCfg) -> anyhow::Result<Option<Arc<dyn GeoLocator>>> {
    let locator: Option<Arc<dyn GeoLocator>> = match cfg.provider {
        GeoProvider::Disabled => None,
        GeoProvider::Fixed => Some(Arc::new(FixedLocator::new(cfg.latitude, cfg.longitude))),
        GeoProvider::Ip => Some(Arc::new(IpLocator::new(
            cfg.endpoint.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )?)),
    };
    Ok(locator)
}
