//! Extension pour intégrer le client radio-browser dans grconfig
//!
//! Ce module fournit le trait `RadioBrowserConfigExt` qui ajoute à
//! `grconfig::Config` les réglages de l'accès amont (section `upstream`) :
//!
//! - nom DNS de découverte des miroirs
//! - miroirs de secours
//! - mélange de l'ordre des miroirs
//! - timeouts (requête, DNS)
//! - User-Agent
//!
//! # Exemple
//!
//! ```no_run
//! use grconfig::get_config;
//! use grbrowser::{RadioBrowserClient, RadioBrowserConfigExt};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! println!("Discovery via {}", config.get_upstream_discovery_host()?);
//!
//! let client = RadioBrowserClient::from_config(&config)?;
//! # Ok(())
//! # }
//! ```

use crate::client::{
    ClientBuilder, RadioBrowserClient, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use crate::resolver::{DEFAULT_DISCOVERY_HOST, DEFAULT_DNS_TIMEOUT_SECS, KNOWN_MIRRORS};
use anyhow::Result;
use grconfig::Config;
use serde_yaml::Value;
use std::time::Duration;

const SECTION: &str = "upstream";

/// Trait d'extension pour la section `upstream` de grconfig
///
/// # Valeurs par défaut
///
/// Quand une clé est absente ou invalide, les getters renvoient la valeur par
/// défaut et l'écrivent dans l'arbre en mémoire (rien n'est écrit sur disque).
pub trait RadioBrowserConfigExt {
    /// Nom DNS résolu pour découvrir les miroirs (vide = découverte désactivée)
    fn get_upstream_discovery_host(&self) -> Result<String>;
    fn set_upstream_discovery_host(&self, host: &str) -> Result<()>;

    /// Miroirs utilisés quand la découverte ne donne rien
    fn get_upstream_fallback_mirrors(&self) -> Result<Vec<String>>;
    fn set_upstream_fallback_mirrors(&self, mirrors: &[String]) -> Result<()>;

    /// Mélange aléatoire de l'ordre des miroirs
    fn get_upstream_shuffle(&self) -> Result<bool>;
    fn set_upstream_shuffle(&self, shuffle: bool) -> Result<()>;

    /// Timeout d'une tentative sur un miroir (secondes)
    fn get_upstream_request_timeout_secs(&self) -> Result<u64>;
    fn set_upstream_request_timeout_secs(&self, secs: u64) -> Result<()>;

    /// Timeout global de la découverte DNS (secondes)
    fn get_upstream_dns_timeout_secs(&self) -> Result<u64>;
    fn set_upstream_dns_timeout_secs(&self, secs: u64) -> Result<()>;

    /// User-Agent envoyé aux miroirs
    fn get_upstream_user_agent(&self) -> Result<String>;
    fn set_upstream_user_agent(&self, user_agent: &str) -> Result<()>;

    /// Builder de client pré-rempli avec ces réglages
    fn radio_browser_client_builder(&self) -> Result<ClientBuilder>;
}

fn get_u64_or_default(config: &Config, key: &str, default: u64) -> Result<u64> {
    let value = config.get_value(&[SECTION, key]).ok().and_then(|v| v.as_u64());
    match value {
        Some(v) if v > 0 => Ok(v),
        _ => {
            config.set_value(&[SECTION, key], Value::Number(default.into()))?;
            Ok(default)
        }
    }
}

fn get_string_or_default(config: &Config, key: &str, default: &str) -> Result<String> {
    match config.get_value(&[SECTION, key]) {
        Ok(Value::String(s)) => Ok(s),
        // `discovery_host: ~` désactive la découverte
        Ok(Value::Null) if key == "discovery_host" => Ok(String::new()),
        _ => {
            config.set_value(&[SECTION, key], Value::String(default.to_string()))?;
            Ok(default.to_string())
        }
    }
}

impl RadioBrowserConfigExt for Config {
    fn get_upstream_discovery_host(&self) -> Result<String> {
        get_string_or_default(self, "discovery_host", DEFAULT_DISCOVERY_HOST)
    }

    fn set_upstream_discovery_host(&self, host: &str) -> Result<()> {
        self.set_value(&[SECTION, "discovery_host"], Value::String(host.to_string()))
    }

    fn get_upstream_fallback_mirrors(&self) -> Result<Vec<String>> {
        match self.get_value(&[SECTION, "fallback_mirrors"]) {
            Ok(Value::Sequence(seq)) => Ok(seq
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()),
            Ok(Value::String(single)) => Ok(vec![single]),
            _ => {
                let defaults: Vec<String> = KNOWN_MIRRORS.iter().map(|m| m.to_string()).collect();
                self.set_upstream_fallback_mirrors(&defaults)?;
                Ok(defaults)
            }
        }
    }

    fn set_upstream_fallback_mirrors(&self, mirrors: &[String]) -> Result<()> {
        let seq = mirrors.iter().cloned().map(Value::String).collect();
        self.set_value(&[SECTION, "fallback_mirrors"], Value::Sequence(seq))
    }

    fn get_upstream_shuffle(&self) -> Result<bool> {
        match self.get_value(&[SECTION, "shuffle"]) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => {
                self.set_upstream_shuffle(true)?;
                Ok(true)
            }
        }
    }

    fn set_upstream_shuffle(&self, shuffle: bool) -> Result<()> {
        self.set_value(&[SECTION, "shuffle"], Value::Bool(shuffle))
    }

    fn get_upstream_request_timeout_secs(&self) -> Result<u64> {
        get_u64_or_default(self, "request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    fn set_upstream_request_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(&[SECTION, "request_timeout_secs"], Value::Number(secs.into()))
    }

    fn get_upstream_dns_timeout_secs(&self) -> Result<u64> {
        get_u64_or_default(self, "dns_timeout_secs", DEFAULT_DNS_TIMEOUT_SECS)
    }

    fn set_upstream_dns_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(&[SECTION, "dns_timeout_secs"], Value::Number(secs.into()))
    }

    fn get_upstream_user_agent(&self) -> Result<String> {
        get_string_or_default(self, "user_agent", DEFAULT_USER_AGENT)
    }

    fn set_upstream_user_agent(&self, user_agent: &str) -> Result<()> {
        self.set_value(&[SECTION, "user_agent"], Value::String(user_agent.to_string()))
    }

    fn radio_browser_client_builder(&self) -> Result<ClientBuilder> {
        Ok(RadioBrowserClient::builder()
            .discovery_host(self.get_upstream_discovery_host()?)
            .fallback_mirrors(self.get_upstream_fallback_mirrors()?)
            .shuffle(self.get_upstream_shuffle()?)
            .timeout(Duration::from_secs(self.get_upstream_request_timeout_secs()?))
            .dns_timeout(Duration::from_secs(self.get_upstream_dns_timeout_secs()?))
            .user_agent(self.get_upstream_user_agent()?))
    }
}

impl RadioBrowserClient {
    /// Construit le client de production (découverte DNS + reqwest) depuis la configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        config.radio_browser_client_builder()?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_embedded_yaml() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(
            config.get_upstream_discovery_host().unwrap(),
            "all.api.radio-browser.info"
        );
        assert_eq!(config.get_upstream_fallback_mirrors().unwrap().len(), 3);
        assert!(config.get_upstream_shuffle().unwrap());
        assert_eq!(config.get_upstream_request_timeout_secs().unwrap(), 10);
        assert_eq!(config.get_upstream_dns_timeout_secs().unwrap(), 5);
    }

    #[test]
    fn test_missing_user_agent_is_written_back() {
        let config = Config::from_yaml_str("").unwrap();
        assert!(config.get_value(&["upstream", "user_agent"]).is_err());

        let ua = config.get_upstream_user_agent().unwrap();
        assert_eq!(ua, DEFAULT_USER_AGENT);
        assert_eq!(
            config.get_value(&["upstream", "user_agent"]).unwrap(),
            Value::String(ua)
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_yaml_str(
            r#"
upstream:
  discovery_host: ""
  fallback_mirrors: https://only.example
  shuffle: false
  request_timeout_secs: 0
"#,
        )
        .unwrap();

        assert_eq!(config.get_upstream_discovery_host().unwrap(), "");
        assert_eq!(
            config.get_upstream_fallback_mirrors().unwrap(),
            vec!["https://only.example".to_string()]
        );
        assert!(!config.get_upstream_shuffle().unwrap());
        // 0 is not a usable timeout
        assert_eq!(config.get_upstream_request_timeout_secs().unwrap(), 10);
    }

    #[test]
    fn test_setters() {
        let config = Config::from_yaml_str("").unwrap();
        config.set_upstream_dns_timeout_secs(2).unwrap();
        config
            .set_upstream_fallback_mirrors(&["https://a".to_string()])
            .unwrap();
        assert_eq!(config.get_upstream_dns_timeout_secs().unwrap(), 2);
        assert_eq!(config.get_upstream_fallback_mirrors().unwrap(), vec!["https://a"]);
    }

    #[test]
    fn test_from_config_builds() {
        let config = Config::from_yaml_str("upstream:\n  discovery_host: \"\"\n").unwrap();
        assert!(RadioBrowserClient::from_config(&config).is_ok());
    }
}
